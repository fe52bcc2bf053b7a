use crate::authz::{AuthzMode, Effect};
use crate::errors::AppError;

/// Engine settings read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthzConfig {
    pub mode: AuthzMode,
    /// Root decision when no policy applies
    pub default_decision: Effect,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            mode: AuthzMode::Strict,
            default_decision: Effect::Deny,
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(mode) = lookup("AUTHZ_MODE") {
            config.mode = mode.parse().map_err(|_| {
                AppError::configuration("AUTHZ_MODE must be off, advisory or strict")
            })?;
        }

        if let Some(decision) = default_decision_from_lookup(&lookup)? {
            config.default_decision = decision;
        }

        Ok(config)
    }
}

/// `AUTHZ_DEFAULT_DECISION` alone, ignoring the other settings
pub fn default_decision_from_env() -> Result<Option<Effect>, AppError> {
    default_decision_from_lookup(|key| std::env::var(key).ok())
}

fn default_decision_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<Effect>, AppError> {
    let Some(decision) = lookup("AUTHZ_DEFAULT_DECISION") else {
        return Ok(None);
    };

    decision
        .parse::<Effect>()
        .ok()
        .filter(|effect| *effect != Effect::NotApplicable)
        .map(Some)
        .ok_or_else(|| {
            AppError::configuration("AUTHZ_DEFAULT_DECISION must be permit or deny")
        })
}
