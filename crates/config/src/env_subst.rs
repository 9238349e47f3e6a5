//! `${ENV_VAR}` placeholder expansion for raw config text.
//!
//! `${NAME:-fallback}` expands to `fallback` when `NAME` is unset or empty.
//! Unresolvable placeholders without a fallback are kept verbatim so the
//! validator can point at them.

/// Replace `${ENV_VAR}` placeholders using the process environment.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };

        match (lookup(name).filter(|v| !v.is_empty()), fallback) {
            _ if name.is_empty() => {
                out.push_str("${");
                out.push_str(expr);
                out.push('}');
            },
            (Some(value), _) => out.push_str(&value),
            (None, Some(fallback)) => out.push_str(fallback),
            (None, None) => {
                out.push_str("${");
                out.push_str(expr);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
