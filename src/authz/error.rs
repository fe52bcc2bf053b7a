use super::Effect;

pub type AuthzResult<T> = Result<T, AuthzError>;

#[derive(thiserror::Error, Debug)]
pub enum AuthzError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("policy `{policy}` returned {effect} from effect()")]
    InvalidEffect { policy: String, effect: Effect },
    #[error("invalid policy document at `{path}`: {message}")]
    Document { path: String, message: String },
    #[error("policy `{policy}` failed: {source}")]
    Policy {
        policy: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AuthzError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn policy(policy: &str, source: anyhow::Error) -> Self {
        Self::Policy {
            policy: policy.to_string(),
            source,
        }
    }
}
