pub mod auth;
pub mod chirps;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod users;
pub mod webhooks;

pub use error::ApiError;
pub use routes::build_router;
pub use state::{AppState, AppStateInner};
