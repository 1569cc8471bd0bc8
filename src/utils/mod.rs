// The `utils` module provides helpers shared by the gateway.

pub mod https;
pub mod template;

pub use crate::utils::template::{TEngine, TEngineError};
