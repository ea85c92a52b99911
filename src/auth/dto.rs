use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Role, User};

/// Request body for account registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
}

/// Registration data that passed validation, password still in plaintext.
#[derive(Debug)]
pub struct RegisterInput {
    pub phone_number: String,
    pub email: Option<String>,
    pub password: String,
}

/// Request body for phone + password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub phone_number: String,
    pub email: Option<String>,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            phone_number: u.phone_number,
            email: u.email,
            role: u.role,
        }
    }
}

/// Field list served on GET for the auth forms.
#[derive(Debug, Serialize)]
pub struct FormDescription {
    pub action: &'static str,
    pub fields: &'static [&'static str],
}
