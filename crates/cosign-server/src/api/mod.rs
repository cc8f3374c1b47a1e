pub mod admin;
pub mod cosign;
pub mod helpers;
pub mod users;
