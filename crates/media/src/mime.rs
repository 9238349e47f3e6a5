/// Content type for a declared attachment file type, if it is one we relay.
///
/// Only `jpg` is supported; matching is exact, so `JPG` or `jpeg` are not.
pub fn content_type_for(filetype: &str) -> Option<&'static str> {
    match filetype {
        "jpg" => Some("image/jpeg"),
        _ => None,
    }
}

pub fn is_supported(filetype: &str) -> bool {
    content_type_for(filetype).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_jpg_is_supported() {
        assert_eq!(content_type_for("jpg"), Some("image/jpeg"));
        for other in ["png", "gif", "pdf", "jpeg", "JPG", ""] {
            assert!(!is_supported(other), "{other}");
        }
    }
}
