use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

/// Principal represents the authenticated user with their cached permissions
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub roles: HashSet<String>,
    pub permissions: HashSet<String>,
    /// Scoped permissions: (permission_name, scope_json)
    pub scoped_permissions: Vec<(String, Value)>,
}

impl Principal {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            roles: HashSet::new(),
            permissions: HashSet::new(),
            scoped_permissions: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_permissions(mut self, perms: impl IntoIterator<Item = String>) -> Self {
        self.permissions = perms.into_iter().collect();
        self
    }

    pub fn with_scoped_permissions(mut self, scoped: Vec<(String, Value)>) -> Self {
        self.scoped_permissions = scoped;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(super::roles::SUPER_ADMIN)
    }
}

/// What the current request is asking to do, as seen by policies
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Handler operation being invoked, e.g. `submission.view`
    pub operation: String,
    /// Journal/press the request is scoped to
    pub context_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    /// Whether the request arrived over HTTPS
    pub secure: bool,
}

impl RequestContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context_id: Uuid) -> Self {
        self.context_id = Some(context_id);
        self
    }

    pub fn with_resource(mut self, resource_type: &str, resource_id: Uuid) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Convert to scope JSON for matching against scoped permissions
    pub fn to_scope_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(ref rt) = self.resource_type {
            map.insert("resource_type".to_string(), Value::String(rt.clone()));
        }
        if let Some(ref rid) = self.resource_id {
            map.insert("resource_id".to_string(), Value::String(rid.to_string()));
        }
        if let Some(ref cid) = self.context_id {
            map.insert("context_id".to_string(), Value::String(cid.to_string()));
        }
        Value::Object(map)
    }
}
