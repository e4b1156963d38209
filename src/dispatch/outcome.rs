use crate::clients::SendError;
use crate::credentials::CredentialError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingCredential,
    Http,
    Network,
    Api,
    InvalidResponse,
    EmptyResponse,
    Internal,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Http => "http",
            Self::Network => "network",
            Self::Api => "api",
            Self::InvalidResponse => "invalid_response",
            Self::EmptyResponse => "empty_response",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one model during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { response: String },
    Failure { kind: FailureKind, message: String },
    Timeout,
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn response(&self) -> Option<&str> {
        match self {
            Self::Success { response } => Some(response),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable reason for anything but a success.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, message } => Some(format!("{kind}: {message}")),
            Self::Timeout => Some("timed out".to_string()),
            Self::Cancelled => Some("cancelled".to_string()),
        }
    }
}

impl From<SendError> for Outcome {
    fn from(err: SendError) -> Self {
        let kind = match &err {
            SendError::Http { .. } => FailureKind::Http,
            SendError::Network(_) => FailureKind::Network,
            SendError::Api(_) => FailureKind::Api,
            SendError::InvalidResponse(_) => FailureKind::InvalidResponse,
            SendError::EmptyResponse => FailureKind::EmptyResponse,
        };
        Self::Failure {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<CredentialError> for Outcome {
    fn from(err: CredentialError) -> Self {
        Self::Failure {
            kind: FailureKind::MissingCredential,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub model_id: i32,
    pub model_name: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// Everything one dispatch produced, keyed by model id.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub prompt_id: i32,
    pub outcomes: BTreeMap<i32, ModelOutcome>,
    pub elapsed: Duration,
}

impl DispatchReport {
    #[must_use]
    pub fn get(&self, model_id: i32) -> Option<&ModelOutcome> {
        self.outcomes.get(&model_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ModelOutcome> {
        self.outcomes.values().filter(|o| o.outcome.is_success())
    }

    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.outcome.label() == label)
            .count()
    }

    /// Outcomes in model-name order, for display.
    #[must_use]
    pub fn by_name(&self) -> Vec<&ModelOutcome> {
        let mut ordered: Vec<_> = self.outcomes.values().collect();
        ordered.sort_by(|a, b| {
            a.model_name
                .cmp(&b.model_name)
                .then(a.model_id.cmp(&b.model_id))
        });
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_error_maps_to_failure_kind() {
        let outcome = Outcome::from(SendError::Http {
            status: 401,
            body: "unauthorized".into(),
        });
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: FailureKind::Http,
                ..
            }
        ));
        assert_eq!(outcome.label(), "failure");
        assert!(outcome.error_message().unwrap().starts_with("http: HTTP 401"));

        let outcome = Outcome::from(CredentialError::Missing("KEY".into()));
        assert!(matches!(
            outcome,
            Outcome::Failure {
                kind: FailureKind::MissingCredential,
                ..
            }
        ));
    }

    #[test]
    fn test_report_helpers() {
        let mut outcomes = BTreeMap::new();
        for (id, name, outcome) in [
            (2, "beta", Outcome::Timeout),
            (
                1,
                "gamma",
                Outcome::Success {
                    response: "ok".into(),
                },
            ),
            (3, "alpha", Outcome::Cancelled),
        ] {
            outcomes.insert(
                id,
                ModelOutcome {
                    model_id: id,
                    model_name: name.into(),
                    outcome,
                    elapsed: Duration::ZERO,
                },
            );
        }
        let report = DispatchReport {
            prompt_id: 9,
            outcomes,
            elapsed: Duration::ZERO,
        };

        assert_eq!(report.len(), 3);
        assert_eq!(report.successes().count(), 1);
        assert_eq!(report.count("timeout"), 1);
        let names: Vec<_> = report.by_name().iter().map(|o| o.model_name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(report.get(1).and_then(|o| o.outcome.response()), Some("ok"));
    }
}
