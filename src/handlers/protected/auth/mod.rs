// Account management for the authenticated caller.

pub mod account;
pub mod password;

pub use account::{account_delete, change_email_post, me_get, profile_put, reset_all_data_post};
pub use password::{change_password_post, set_password_post};
