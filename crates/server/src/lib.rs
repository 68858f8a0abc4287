//! Triage Server - HTTP REST API for civic issue triage
//!
//! This crate wraps the triage pipeline in a production HTTP server:
//!
//! - **Triage**: submit an issue (image reference, description, location) and
//!   receive the structured verdict
//! - **Corpus maintenance**: register existing issues and known-fake images
//! - **Health & Stats**: liveness/readiness probes, model/corpus status, and
//!   the static decision thresholds
//!
//! # Features
//!
//! - **Authentication**: API key-based authentication with rate limiting
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: Environment variable and file-based configuration
//! - **Error Handling**: Error responses with stable error codes
//! - **Graceful Shutdown**: Proper signal handling for deployments
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe (model loaded, corpus size)
//! - `GET /ready` - Readiness probe
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `POST /api/v1/triage` - Triage one submission
//! - `POST /api/v1/issues/register` - Register an existing issue
//! - `POST /api/v1/fakes/register` - Register a known-fake image
//! - `GET /api/v1/stats` - Category list and decision thresholds

pub mod acquire;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
