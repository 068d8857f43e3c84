pub mod auth;
pub mod csrf;
pub mod entries;
pub mod error;
pub mod forms;
pub mod habits;
pub mod middleware;
pub mod pages;
pub mod render;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

// Re-export what the binary needs to assemble the server.
pub use routes::{build_app, routes};
pub use state::AppState;
