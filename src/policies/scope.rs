use std::sync::Arc;

use serde_json::Value;

use crate::authz::{Advice, AuthorizedContext, Effect, Policy, Principal, RequestContext};

const SCOPE_KEYS: [&str; 3] = ["context_id", "resource_type", "resource_id"];

/// Permission check with optional scope.
///
/// Evaluation order:
/// 1. super_admin role -> permit
/// 2. direct user permission -> permit
/// 3. scoped permission whose scope matches the request -> permit
/// 4. deny
#[derive(Debug)]
pub struct ScopedPermissionPolicy {
    principal: Arc<Principal>,
    request: Arc<RequestContext>,
    permission: String,
    advice: Advice,
}

impl ScopedPermissionPolicy {
    pub fn new(
        principal: Arc<Principal>,
        request: Arc<RequestContext>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            principal,
            request,
            permission: permission.into(),
            advice: Advice::default(),
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }

    /// Check if a scope matches the request.
    ///
    /// Every key of `SCOPE_KEYS` the scope names must equal the same key in
    /// the request's scope JSON; keys the request lacks never match.
    fn scope_matches(scope: &Value, req: &RequestContext) -> bool {
        // Empty scope matches everything
        if scope.is_null() || scope.as_object().map(|o| o.is_empty()).unwrap_or(false) {
            return true;
        }

        let scope_obj = match scope.as_object() {
            Some(o) => o,
            None => return false,
        };

        let request_scope = req.to_scope_json();
        SCOPE_KEYS
            .iter()
            .all(|key| match scope_obj.get(*key).and_then(|v| v.as_str()) {
                Some(expected) => {
                    request_scope.get(*key).and_then(|v| v.as_str()) == Some(expected)
                }
                None => true,
            })
    }
}

impl Policy for ScopedPermissionPolicy {
    fn name(&self) -> &str {
        "scoped_permission"
    }

    fn effect(&self, _ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        let principal = &self.principal;
        let permission = self.permission.as_str();

        if principal.is_super_admin() {
            tracing::debug!(user_id = %principal.user_id, permission, "super_admin bypass");
            return Ok(Effect::Permit);
        }

        if principal.has_permission(permission) {
            tracing::debug!(user_id = %principal.user_id, permission, "direct permission match");
            return Ok(Effect::Permit);
        }

        for (perm_name, scope) in &principal.scoped_permissions {
            if perm_name == permission && Self::scope_matches(scope, &self.request) {
                tracing::debug!(
                    user_id = %principal.user_id,
                    permission,
                    scope = ?scope,
                    "scoped permission match"
                );
                return Ok(Effect::Permit);
            }
        }

        tracing::debug!(user_id = %principal.user_id, permission, "permission denied");
        Ok(Effect::Deny)
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn decide(principal: Principal, request: RequestContext, permission: &str) -> Effect {
        ScopedPermissionPolicy::new(Arc::new(principal), Arc::new(request), permission)
            .effect(&mut AuthorizedContext::new())
            .unwrap()
    }

    #[test]
    fn test_direct_permission_permits() {
        let principal = Principal::new(Uuid::new_v4())
            .with_permissions(vec!["submission.create".to_string()]);

        let req = RequestContext::new("x");
        assert_eq!(
            decide(principal.clone(), req.clone(), "submission.create"),
            Effect::Permit
        );
        assert_eq!(decide(principal, req, "submission.delete"), Effect::Deny);
    }

    #[test]
    fn test_scoped_permission_matches_context() {
        let context_id = Uuid::new_v4();
        let scope = serde_json::json!({"context_id": context_id.to_string()});
        let principal = Principal::new(Uuid::new_v4())
            .with_scoped_permissions(vec![("submission.view".to_string(), scope)]);

        let req = RequestContext::new("submission.view").with_context(context_id);
        assert_eq!(
            decide(principal.clone(), req, "submission.view"),
            Effect::Permit
        );

        // Different context should not match
        let other = RequestContext::new("submission.view").with_context(Uuid::new_v4());
        assert_eq!(
            decide(principal.clone(), other, "submission.view"),
            Effect::Deny
        );

        // Scope names a context but the request has none
        let bare = RequestContext::new("submission.view");
        assert_eq!(decide(principal, bare, "submission.view"), Effect::Deny);
    }

    #[test]
    fn test_scope_on_resource() {
        let resource_id = Uuid::new_v4();
        let scope = serde_json::json!({
            "resource_type": "submission",
            "resource_id": resource_id.to_string()
        });
        let principal = Principal::new(Uuid::new_v4())
            .with_scoped_permissions(vec![("submission.edit".to_string(), scope)]);

        let req = RequestContext::new("submission.edit").with_resource("submission", resource_id);
        assert_eq!(
            decide(principal.clone(), req, "submission.edit"),
            Effect::Permit
        );

        let wrong_type =
            RequestContext::new("submission.edit").with_resource("publication", resource_id);
        assert_eq!(
            decide(principal, wrong_type, "submission.edit"),
            Effect::Deny
        );
    }

    #[test]
    fn test_every_scope_key_must_match() {
        let context_id = Uuid::new_v4();
        let scope = serde_json::json!({
            "context_id": context_id.to_string(),
            "resource_type": "submission",
            "stage": "review"
        });
        let principal = Principal::new(Uuid::new_v4())
            .with_scoped_permissions(vec![("submission.view".to_string(), scope)]);

        // Unknown keys such as `stage` are ignored
        let req = RequestContext::new("submission.view")
            .with_context(context_id)
            .with_resource("submission", Uuid::new_v4());
        assert_eq!(
            decide(principal.clone(), req, "submission.view"),
            Effect::Permit
        );

        // Context matches but the request names no resource type
        let req = RequestContext::new("submission.view").with_context(context_id);
        assert_eq!(decide(principal, req, "submission.view"), Effect::Deny);
    }

    #[test]
    fn test_empty_scope_matches_all() {
        let principal = Principal::new(Uuid::new_v4())
            .with_scoped_permissions(vec![("submission.view".to_string(), serde_json::json!({}))]);

        let req = RequestContext::new("submission.view").with_context(Uuid::new_v4());
        assert_eq!(decide(principal, req, "submission.view"), Effect::Permit);
    }
}
