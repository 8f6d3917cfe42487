//! HTTP host for the Ferrex web client.
//!
//! Serves every page through the SSR pipeline in [`ferrex_web`]: the
//! request's cookies and client hints go in, a fully rendered document with
//! the embedded hydration payload comes out.

pub mod config;
pub mod errors;
pub mod pages;
pub mod probe;
pub mod routes;
pub mod state;

pub use routes::create_app;
pub use state::AppState;
