//! HTTP API for the PharmaLens reporting pipeline.
//!
//! Thin request/response mapping over the report generator, knowledge
//! store, and collectors. The generator's contract guarantees a
//! well-formed artifact, so degraded conditions surface as embedded
//! status fields rather than HTTP errors.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{Result, ServiceError};
pub use server::{ReportServer, run_from_env};
pub use state::AppState;
