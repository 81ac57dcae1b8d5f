use serde::Serialize;
use utoipa::ToSchema;

/// Principal attached to every authenticated request. The rest of the
/// system only requires its presence.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    pub subject: String,
}
