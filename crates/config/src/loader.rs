use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::CourierConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "courier.toml",
    "courier.yaml",
    "courier.yml",
    "courier.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<CourierConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./courier.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/courier/courier.{toml,yaml,yml,json}` (user-global)
///
/// Returns the config and the file it came from. Defaults apply only when no
/// file is found; a file that fails to load is an error.
pub fn discover_and_load() -> Result<(CourierConfig, Option<PathBuf>)> {
    let path = find_config_file();
    Ok((load_or_default(path.as_deref())?, path))
}

/// Load `path` if given, otherwise fall back to `CourierConfig::default()`.
pub fn load_or_default(path: Option<&Path>) -> Result<CourierConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(CourierConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/courier/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<CourierConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use secrecy::ExposeSecret;

    use {super::*, crate::schema::AttachmentFailurePolicy};

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "courier.toml",
            r#"
[server]
port = 9000

[vault]
vault_url = "https://kv.vault.azure.net"
client_id = "app"
client_secret = "hunter2"

[blob]
endpoint = "https://acct.blob.core.windows.net"
container = "uploads"
token_secret = "BlobSas"

[relay]
on_attachment_failure = "relay_text"
"#,
        );

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.vault.client_secret.expose_secret(), "hunter2");
        assert_eq!(cfg.blob.container, "uploads");
        assert_eq!(
            cfg.relay.on_attachment_failure,
            AttachmentFailurePolicy::RelayText
        );
        assert_eq!(cfg.slack.download_token_secret, "SlackToken");
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(&dir, "courier.yaml", "queue:\n  connection_string_secret: SbConn\n");
        let json = write(
            &dir,
            "courier.json",
            r#"{"slack": {"history_token_secret": "HistoryToken"}}"#,
        );

        assert_eq!(
            load_config(&yaml).unwrap().queue.connection_string_secret,
            "SbConn"
        );
        assert_eq!(
            load_config(&json).unwrap().slack.history_token_secret,
            "HistoryToken"
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "courier.ini", "port=1");
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn broken_file_is_not_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "courier.toml", "[server\nport = 9000\n");
        assert!(matches!(load_or_default(Some(&path)), Err(Error::Toml(_))));
    }

    #[test]
    fn no_file_means_defaults() {
        let cfg = load_or_default(None).unwrap();
        assert_eq!(cfg.server.port, CourierConfig::default().server.port);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/courier.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/courier.toml"));
    }
}
