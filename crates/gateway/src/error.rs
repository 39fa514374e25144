use coachdesk_core::{DomainError, ResourceType};

/// Failures surfaced by entity gateways.
///
/// Scope resolution never produces one of these; they only describe the
/// backend round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error for {resource}: {message}")]
    Parse {
        resource: String,
        message: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn parse(resource: ResourceType, message: impl Into<String>) -> Self {
        Self::Parse {
            resource: resource.to_string(),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Api(401 | 403, _))
    }
}

impl From<DomainError> for GatewayError {
    fn from(value: DomainError) -> Self {
        GatewayError::Config(value.to_string())
    }
}
