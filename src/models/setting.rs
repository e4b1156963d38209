use serde::{Deserialize, Serialize};

/// Per-model timeout in seconds, overriding `dispatch.request_timeout_seconds`.
pub const REQUEST_TIMEOUT_SECONDS: &str = "request_timeout_seconds";

/// Overall dispatch deadline in seconds, overriding `dispatch.overall_deadline_seconds`.
pub const OVERALL_DEADLINE_SECONDS: &str = "overall_deadline_seconds";

/// Persist every successful outcome right after dispatch.
pub const AUTO_SAVE: &str = "auto_save";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
    pub updated_at: String,
}

/// Reads a stored flag. Accepts the spellings people type into config
/// dialogs; anything else is `None`.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
