pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use routes::{router, AppState};
