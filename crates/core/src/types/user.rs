//! Signed-in user profile.

use serde::{Deserialize, Serialize};

/// Minimal profile returned by the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: String,
}
