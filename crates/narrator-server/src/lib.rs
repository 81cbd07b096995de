//! # narrator-server
//!
//! HTTP shell around the Narrator workflow.
//!
//! Provides:
//! - The single and stateful HTML forms
//! - Per-session generate and delete endpoints
//! - Audio file serving from the output directory
//! - Health, readiness, info and Prometheus metrics endpoints

pub mod routes;
pub mod server;
pub mod ui;

pub use routes::{AppState, create_router};
pub use server::NarratorServer;
