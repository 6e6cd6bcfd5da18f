pub mod api;
pub mod auth;
pub mod error;

pub use api::{router, AppState};
pub use auth::AdminCredentials;
