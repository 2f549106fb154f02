// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition and password recovery; none of these require a bearer token.

use serde::Serialize;

use crate::database::models::AccountView;

pub mod login; // POST /api/auth/login
pub mod password; // POST /api/auth/forgot-password, /api/auth/reset-password
pub mod register; // POST /api/auth/signup

pub use login::login_post;
pub use password::{forgot_password_post, reset_password_post};
pub use register::signup_post;

/// Body returned by signup and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: AccountView,
    pub access_token: String,
}
