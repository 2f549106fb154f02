// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /, /health, /api/auth/{signup,login,forgot-password,reset-password}

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::{health, root};
