//! Page-level views, one per route.

pub mod dashboard;
pub mod forgot_password;
pub mod login;
pub mod register;
pub mod reset_password;
pub mod verify_email;
