//! Reusable policies for handler authorization.
//!
//! Each policy is a small struct built from explicit inputs (the principal,
//! the request) and composed into policy sets by the caller:
//! context-required, then role-based, then resource ownership.

mod request;
mod resource;
mod role;
mod scope;

pub use request::{ContextRequiredPolicy, HttpsPolicy};
pub use resource::{AuthorizedContextRequiredPolicy, Owned, OwnershipPolicy, ResourceRequiredPolicy};
pub use role::RoleBasedOperationPolicy;
pub use scope::ScopedPermissionPolicy;

use std::collections::HashSet;

use crate::authz::Principal;

/// Roles from `roles` the principal holds, in the order given
pub fn matched_roles(principal: &Principal, roles: &[String]) -> Vec<String> {
    roles
        .iter()
        .filter(|role| principal.has_role(role))
        .cloned()
        .collect()
}

/// Whether `operation` is on the whitelist
pub fn operation_allowed(operations: &HashSet<String>, operation: &str) -> bool {
    operations.contains(operation)
}
