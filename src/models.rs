pub mod auth;
pub mod item;
pub mod request;
pub mod warehouse;
