// Extracta Core - Domain Logic, Ports & Orchestration
// NO network dependencies: adapters live in infra-web and api-rpc

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
