use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AuthzError;

/// Outcome of evaluating a policy or policy set.
///
/// `NotApplicable` only exists inside the evaluator; it is never the result
/// of `Policy::effect()` nor of `AuthorizationDecisionManager::decide()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Permit,
    Deny,
    NotApplicable,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Permit => "permit",
            Effect::Deny => "deny",
            Effect::NotApplicable => "not_applicable",
        }
    }

    pub fn is_permit(&self) -> bool {
        matches!(self, Effect::Permit)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Effect::Deny)
    }

    /// Reject `NotApplicable` where only a final effect is allowed
    pub(crate) fn require_final(self, what: &str) -> Result<Self, AuthzError> {
        match self {
            Effect::NotApplicable => Err(AuthzError::configuration(format!(
                "{what} must be permit or deny, not not_applicable"
            ))),
            effect => Ok(effect),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permit" => Ok(Effect::Permit),
            "deny" => Ok(Effect::Deny),
            "not_applicable" => Ok(Effect::NotApplicable),
            other => Err(AuthzError::configuration(format!(
                "unknown effect `{other}`"
            ))),
        }
    }
}

/// How a policy set folds the effects of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombiningAlgorithm {
    #[serde(alias = "deny-overrides")]
    DenyOverrides,
    #[serde(alias = "permit-overrides")]
    PermitOverrides,
}

impl CombiningAlgorithm {
    /// The effect that short-circuits evaluation of the set
    pub fn dominant(&self) -> Effect {
        match self {
            CombiningAlgorithm::DenyOverrides => Effect::Deny,
            CombiningAlgorithm::PermitOverrides => Effect::Permit,
        }
    }

    /// The effect a later dominant child can override
    pub fn overridden(&self) -> Effect {
        match self {
            CombiningAlgorithm::DenyOverrides => Effect::Permit,
            CombiningAlgorithm::PermitOverrides => Effect::Deny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombiningAlgorithm::DenyOverrides => "deny_overrides",
            CombiningAlgorithm::PermitOverrides => "permit_overrides",
        }
    }
}

impl fmt::Display for CombiningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombiningAlgorithm {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "deny_overrides" => Ok(CombiningAlgorithm::DenyOverrides),
            "permit_overrides" => Ok(CombiningAlgorithm::PermitOverrides),
            other => Err(AuthzError::configuration(format!(
                "unknown combining algorithm `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_and_overridden_are_opposites() {
        for alg in [CombiningAlgorithm::DenyOverrides, CombiningAlgorithm::PermitOverrides] {
            assert_ne!(alg.dominant(), alg.overridden());
            assert_ne!(alg.dominant(), Effect::NotApplicable);
        }
        assert_eq!(CombiningAlgorithm::DenyOverrides.dominant(), Effect::Deny);
        assert_eq!(
            CombiningAlgorithm::PermitOverrides.dominant(),
            Effect::Permit
        );
    }

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!(
            "permit-overrides".parse::<CombiningAlgorithm>().unwrap(),
            CombiningAlgorithm::PermitOverrides
        );
        assert_eq!(
            "DENY_OVERRIDES".parse::<CombiningAlgorithm>().unwrap(),
            CombiningAlgorithm::DenyOverrides
        );
        assert!(matches!(
            "first_applicable".parse::<CombiningAlgorithm>(),
            Err(AuthzError::Configuration(_))
        ));
    }

    #[test]
    fn test_require_final_rejects_not_applicable() {
        assert!(Effect::NotApplicable.require_final("default").is_err());
        assert_eq!(Effect::Deny.require_final("default").unwrap(), Effect::Deny);
    }
}
