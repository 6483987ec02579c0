pub mod config;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod transaction;
