pub mod auth;
pub mod errors;
pub mod extract;
pub mod models;
pub mod routes;
pub mod service;

pub use errors::ApiError;
pub use extract::ApiJson;
pub use routes::{create_app, AppState};
pub use service::{DeleteOutcome, RetrievalService};
