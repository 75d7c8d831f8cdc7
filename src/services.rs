pub mod auth;
pub mod bodega_api;
pub mod inventory_store;
