//! JSON-RPC API Layer
//!
//! Transport bridge for Extracta: poll-style job methods plus a push-style
//! event stream, served as JSON-RPC 2.0 over HTTP and WebSocket.

pub mod error;
pub mod handler;
pub mod server;
pub mod stream;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
pub use stream::{FrameError, FrameSink, StreamBridge, StreamOutcome};
