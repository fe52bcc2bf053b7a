use crate::authz::{AuthorizationDecisionManager, AuthzMode, Effect};
use crate::errors::{AppError, AppResult};

/// Run the decision for a handler and apply the enforcement mode.
///
/// - `Off` skips evaluation entirely and lets the request through.
/// - `Advisory` evaluates, logs a denial, and lets the request through.
/// - `Strict` turns a denial into `AppError::Forbidden` with the collected messages.
///
/// Any call-on-deny advice has already run by the time this returns. An
/// evaluation error surfaces as `AppError::Internal`, never as a permit.
pub fn enforce(manager: &mut AuthorizationDecisionManager, mode: AuthzMode) -> AppResult<Effect> {
    if mode == AuthzMode::Off {
        return Ok(Effect::Permit);
    }

    let effect = manager.decide()?;
    if effect == Effect::Permit {
        return Ok(effect);
    }

    match mode {
        AuthzMode::Advisory => {
            tracing::warn!(
                messages = ?manager.authorization_messages(),
                "authorization denied (advisory mode, request allowed)"
            );
            Ok(Effect::Permit)
        }
        _ => Err(AppError::denied(manager.authorization_messages())),
    }
}
