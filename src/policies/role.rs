use std::collections::HashSet;
use std::sync::Arc;

use super::{matched_roles, operation_allowed};
use crate::authz::{Advice, AssocType, AuthorizedContext, Effect, Policy, Principal, RequestContext};

/// Permit when the principal holds an allowed role and the requested
/// operation is whitelisted for those roles.
///
/// Evaluation order:
/// 1. super_admin role -> permit
/// 2. operation not whitelisted -> deny
/// 3. any (or, with `require_all_roles`, every) listed role held -> permit
/// 4. deny
///
/// On permit the matched roles are published under `AssocType::UserRoles`.
#[derive(Debug)]
pub struct RoleBasedOperationPolicy {
    principal: Arc<Principal>,
    request: Arc<RequestContext>,
    roles: Vec<String>,
    operations: HashSet<String>,
    all_roles: bool,
    advice: Advice,
}

impl RoleBasedOperationPolicy {
    pub fn new<R, O>(
        principal: Arc<Principal>,
        request: Arc<RequestContext>,
        roles: R,
        operations: O,
    ) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            principal,
            request,
            roles: roles.into_iter().map(Into::into).collect(),
            operations: operations.into_iter().map(Into::into).collect(),
            all_roles: false,
            advice: Advice::default(),
        }
    }

    pub fn require_all_roles(mut self) -> Self {
        self.all_roles = true;
        self
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl Policy for RoleBasedOperationPolicy {
    fn name(&self) -> &str {
        "role_based_operation"
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        if self.principal.is_super_admin() {
            tracing::debug!(user_id = %self.principal.user_id, "super_admin bypass");
            return Ok(Effect::Permit);
        }

        if !operation_allowed(&self.operations, &self.request.operation) {
            tracing::debug!(operation = %self.request.operation, "operation not whitelisted");
            return Ok(Effect::Deny);
        }

        let matched = matched_roles(&self.principal, &self.roles);
        let granted = if self.all_roles {
            !self.roles.is_empty() && matched.len() == self.roles.len()
        } else {
            !matched.is_empty()
        };

        if !granted {
            return Ok(Effect::Deny);
        }

        ctx.insert(AssocType::UserRoles, matched);
        Ok(Effect::Permit)
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}
