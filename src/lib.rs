// src/lib.rs

pub mod config;
pub mod error;
pub mod exam;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

// Re-export specific items for convenience if needed
pub use routes::create_router;
