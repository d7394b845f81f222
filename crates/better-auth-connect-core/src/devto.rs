// Dev.to wire types shared by the client service and the backend route.

use serde::{Deserialize, Serialize};

/// `Accept` value required by the Forem v1 API.
pub const DEVTO_ACCEPT: &str = "application/vnd.forem.api-v1+json";

/// Header carrying the user's API key.
pub const DEVTO_API_KEY_HEADER: &str = "api-key";

/// Profile returned by `GET /api/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevToProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub joined_at: Option<String>,
}

impl DevToProfile {
    /// Account id under which the key is stored: `devto-{id}`.
    pub fn account_id(&self) -> String {
        format!("devto-{}", self.id)
    }
}

/// Body of `POST /devto/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// The account summary echoed back after storing a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedAccount {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddApiKeyResponse {
    pub success: bool,
    pub account: AddedAccount,
}
