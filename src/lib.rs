//! # nanogate: a Gemini gateway with retrying calls and model fallback.

/// The `config` module reads runtime settings from the environment.
pub mod config;
/// The `gateway` module implements the user-facing features.
pub mod gateway;
/// The `llm` module holds the upstream clients and the orchestration around them.
pub mod llm;
/// The `server` module exposes the gateway over HTTP.
pub mod server;
/// The `shutdown` module provides a trait for gracefully shutting down the server.
pub mod shutdown;
/// The `telemetry` module installs the tracing subscriber.
pub mod telemetry;
/// The `utils` module provides utility functions shared by the other modules.
pub mod utils;

pub use config::{ConfigError, GatewayConfig, TextBackend};
pub use gateway::{Feature, FeatureReply, FeatureRequest, Gateway, GatewayError};
pub use server::{AppState, app_router};
