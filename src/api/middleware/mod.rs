pub mod auth;
pub mod bootstrap;
