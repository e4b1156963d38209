use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i32,
    pub created_at: String,
    pub text: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptSort {
    #[default]
    NewestFirst,
    OldestFirst,
    Id,
}

/// Trims labels, drops blank ones and removes duplicates while keeping the
/// first occurrence.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Splits a comma separated label list, as typed on the command line.
#[must_use]
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["  rust ", "", "sql", "rust", "   "]);
        assert_eq!(tags, vec!["rust".to_string(), "sql".to_string()]);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("a, b,,a , c"), vec!["a", "b", "c"]);
        assert!(parse_tag_list(" , ").is_empty());
    }
}
