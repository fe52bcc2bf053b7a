//! Authorization module - Policy Decision Engine
//!
//! This module implements the policy combination engine:
//! - Leaf policies (`Policy`) with optional advice
//! - Nested policy sets folded by deny-overrides or permit-overrides
//! - A root decision manager that collects deny messages and runs call-on-deny advice
//! - A shared authorized context that policies publish resolved objects into

mod advice;
mod context;
mod effect;
mod error;
mod manager;
mod policy;
mod policy_set;
mod principal;

pub use advice::{Advice, AdviceKind, CallOnDeny};
pub use context::{AssocType, AuthorizedContext};
pub use effect::{CombiningAlgorithm, Effect};
pub use error::{AuthzError, AuthzResult};
pub use manager::AuthorizationDecisionManager;
pub use policy::{FnPolicy, Policy};
pub use policy_set::{PolicyNode, PolicySet};
pub use principal::{Principal, RequestContext};

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthzMode {
    /// No permission checks (development mode)
    Off,
    /// Log denials but allow requests (testing mode)
    Advisory,
    /// Enforce 403 on denied requests (production mode)
    Strict,
}

impl FromStr for AuthzMode {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(AuthzMode::Off),
            "advisory" => Ok(AuthzMode::Advisory),
            "strict" => Ok(AuthzMode::Strict),
            other => Err(AuthzError::configuration(format!(
                "unknown authz mode `{other}`"
            ))),
        }
    }
}

/// Well-known role names
pub mod roles {
    pub const SUPER_ADMIN: &str = "super_admin";
    pub const MANAGER: &str = "manager";
    pub const SUB_EDITOR: &str = "sub_editor";
    pub const ASSISTANT: &str = "assistant";
    pub const AUTHOR: &str = "author";
    pub const REVIEWER: &str = "reviewer";
    pub const READER: &str = "reader";
}
