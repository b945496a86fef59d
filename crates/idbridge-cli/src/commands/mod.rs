pub mod auth_url;
pub mod claims;
pub mod providers;
