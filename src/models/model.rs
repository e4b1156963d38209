use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider family of a model endpoint.
///
/// Known families get request shaping of their own; anything else is kept
/// verbatim and talked to as a generic OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Groq,
    OpenRouter,
    Other(String),
}

impl ProviderKind {
    /// Classifies a free-text provider label. Blank labels yield `None`.
    ///
    /// ```rust
    /// use chatlist::models::model::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("OpenRouter"), Some(ProviderKind::OpenRouter));
    /// assert_eq!(ProviderKind::parse("gpt-4o"), Some(ProviderKind::OpenAi));
    /// assert_eq!(ProviderKind::parse("  "), None);
    /// ```
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        let lower = trimmed.to_lowercase();
        // openrouter hosts openai models, so it has to win over "gpt"
        let kind = if lower.contains("openrouter") {
            Self::OpenRouter
        } else if lower.contains("openai") || lower.contains("gpt") {
            Self::OpenAi
        } else if lower.contains("deepseek") {
            Self::DeepSeek
        } else if lower.contains("groq") {
            Self::Groq
        } else {
            Self::Other(trimmed.to_string())
        };

        Some(kind)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::DeepSeek => "DeepSeek",
            Self::Groq => "Groq",
            Self::OpenRouter => "OpenRouter",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).ok_or_else(|| serde::de::Error::custom("empty provider label"))
    }
}

/// A configured text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageModel {
    pub id: i32,
    pub name: String,
    pub api_url: String,
    pub credential_ref: String,
    pub is_active: bool,
    pub provider: Option<ProviderKind>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModel {
    pub name: String,
    pub api_url: String,
    pub credential_ref: String,
    pub provider: Option<ProviderKind>,
}

impl NewModel {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        credential_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            credential_ref: credential_ref.into(),
            provider: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Partial update of a model. `None` leaves a field untouched; `provider`
/// uses `Some(None)` to clear the label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelUpdate {
    pub name: Option<String>,
    pub api_url: Option<String>,
    pub credential_ref: Option<String>,
    pub provider: Option<Option<ProviderKind>>,
    pub is_active: Option<bool>,
}

impl ModelUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.api_url.is_none()
            && self.credential_ref.is_none()
            && self.provider.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_providers() {
        assert_eq!(ProviderKind::parse("openai"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::parse("DeepSeek"), Some(ProviderKind::DeepSeek));
        assert_eq!(ProviderKind::parse("groq cloud"), Some(ProviderKind::Groq));
        assert_eq!(
            ProviderKind::parse("openrouter/gpt"),
            Some(ProviderKind::OpenRouter)
        );
    }

    #[test]
    fn test_parse_unknown_provider_keeps_label() {
        assert_eq!(
            ProviderKind::parse(" Mistral "),
            Some(ProviderKind::Other("Mistral".to_string()))
        );
        assert_eq!(ProviderKind::Other("Mistral".into()).to_string(), "Mistral");
    }

    #[test]
    fn test_label_round_trips_through_parse() {
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::DeepSeek,
            ProviderKind::Groq,
            ProviderKind::OpenRouter,
        ] {
            assert_eq!(ProviderKind::parse(kind.label()), Some(kind.clone()));
        }
    }

    #[test]
    fn test_model_update_is_empty() {
        assert!(ModelUpdate::default().is_empty());
        let update = ModelUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
