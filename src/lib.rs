pub mod authz;
pub mod config;
pub mod document;
pub mod errors;
pub mod http;
pub mod policies;

// Re-export commonly used items for tests
pub use authz::{AuthorizationDecisionManager, Effect, PolicySet};
pub use config::AuthzConfig;
