//! JSON-RPC Server
//!
//! HTTP and WebSocket on one TCP port. Poll methods go to the registry; the
//! subscription opens a run directly through the stream bridge.

use crate::handler::RpcHandler;
use crate::stream::StreamBridge;
use crate::types::{JobIdRequest, SubmitRequest, SubscribeRequest};
use extracta_core::application::{validate_request, JobRegistry, RunOrchestrator};
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

pub mod method {
    pub const SUBMIT: &str = "extract.submit.v1";
    pub const STATUS: &str = "extract.status.v1";
    pub const RESULT: &str = "extract.result.v1";
    pub const STATS: &str = "admin.stats.v1";
    pub const SUBSCRIBE: &str = "extract.subscribe.v1";
    pub const NOTIFICATION: &str = "extract.event";
    pub const UNSUBSCRIBE: &str = "extract.unsubscribe.v1";
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    /// Trip the run's cancel token when a stream consumer goes away
    pub cancel_on_disconnect: bool,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            cancel_on_disconnect: false,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
    bridge: Arc<StreamBridge>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        registry: Arc<JobRegistry>,
        orchestrator: Arc<RunOrchestrator>,
    ) -> Self {
        let extractors = orchestrator.extractors().entries();
        let bridge = StreamBridge::new(orchestrator, config.cancel_on_disconnect);
        Self {
            config,
            handler: Arc::new(RpcHandler::new(registry, extractors)),
            bridge: Arc::new(bridge),
        }
    }

    /// Build the method table
    pub fn into_module(self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(method::SUBMIT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitRequest = params.parse()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::STATUS, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: JobIdRequest = params.parse()?;
                    handler.status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::RESULT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: JobIdRequest = params.parse()?;
                    handler.result(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::STATS, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats().await }
            })
            .map_err(|e| e.to_string())?;

        let bridge = self.bridge.clone();
        module
            .register_subscription(
                method::SUBSCRIBE,
                method::NOTIFICATION,
                method::UNSUBSCRIBE,
                move |params, pending, _, _| {
                    let bridge = bridge.clone();
                    async move {
                        let req: SubscribeRequest = match params.parse() {
                            Ok(req) => req,
                            Err(e) => {
                                pending.reject(e).await;
                                return Ok(());
                            }
                        };
                        if let Err(e) = validate_request(&req.request) {
                            pending.reject(crate::error::to_rpc_error(e)).await;
                            return Ok(());
                        }

                        let sink = pending.accept().await?;
                        let outcome = bridge.stream(req.mode, req.request, &sink).await;
                        if outcome.disconnected {
                            warn!(frames_sent = outcome.frames_sent, "Subscriber left before the run finished");
                        }
                        SubscriptionResult::Ok(())
                    }
                },
            )
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Security: binds to the configured host only (127.0.0.1 by default)
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            cancel_on_disconnect = self.config.cancel_on_disconnect,
            "Starting JSON-RPC server (HTTP + WebSocket)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.into_module()?;
        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extracta_core::application::{job_queue, ExtractorRegistry, InMemoryJobStore, QueueReceiver};
    use extracta_core::domain::FetchMode;
    use extracta_core::port::execution_context::mocks::MockContextProvider;
    use extracta_core::port::extractor::mocks::MockExtractor;
    use extracta_core::port::id_provider::mocks::SequentialIdProvider;
    use extracta_core::port::time_provider::mocks::SteppingClock;
    use jsonrpsee::core::params::ObjectParams;
    use jsonrpsee::core::server::MethodsError;
    use serde_json::{json, Value};

    fn server() -> (RpcServer, QueueReceiver) {
        let (tx, rx) = job_queue();
        let registry = Arc::new(JobRegistry::new(
            Arc::new(InMemoryJobStore::new()),
            tx,
            Arc::new(SequentialIdProvider::new("job")),
            Arc::new(SteppingClock::new(0, 1)),
        ));
        let orchestrator = Arc::new(RunOrchestrator::new(
            Arc::new(ExtractorRegistry::new().with(
                FetchMode::One,
                "web",
                "generic",
                Arc::new(MockExtractor::returning(json!({"title": "A"}))),
            )),
            Arc::new(MockContextProvider::serving("<html></html>")),
            Arc::new(SequentialIdProvider::new("run")),
            Arc::new(SteppingClock::new(0, 1)),
            Default::default(),
        ));
        (
            RpcServer::new(RpcServerConfig::default(), registry, orchestrator),
            rx,
        )
    }

    fn params(pairs: &[(&str, Value)]) -> ObjectParams {
        let mut params = ObjectParams::new();
        for (name, value) in pairs {
            params.insert(name, value.clone()).unwrap();
        }
        params
    }

    fn error_code(err: MethodsError) -> i32 {
        match err {
            MethodsError::JsonRpc(e) => e.code(),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_module_routes_poll_methods() {
        let (server, _rx) = server();
        let module = server.into_module().unwrap();

        let submitted: Value = module
            .call(
                method::SUBMIT,
                params(&[
                    (
                        "request",
                        json!({"category": "web", "source": "generic", "url": "https://example.com"}),
                    ),
                    ("mode", json!("list")),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(submitted["jobId"], "job-1");
        assert_eq!(submitted["status"], "queued");

        let status: Value = module
            .call(method::STATUS, params(&[("jobId", json!("job-1"))]))
            .await
            .unwrap();
        assert_eq!(status["mode"], "list");
        assert_eq!(status["currentStep"], "Queued");

        let result: Value = module
            .call(method::RESULT, params(&[("jobId", json!("job-1"))]))
            .await
            .unwrap();
        assert_eq!(result["pending"], true);

        let stats: Value = module.call(method::STATS, ObjectParams::new()).await.unwrap();
        assert_eq!(stats["totalJobs"], 1);
        assert_eq!(stats["extractors"], json!(["one:web/generic"]));
    }

    #[tokio::test]
    async fn test_module_maps_errors_to_codes() {
        let (server, _rx) = server();
        let module = server.into_module().unwrap();

        let err = module
            .call::<_, Value>(method::STATUS, params(&[("jobId", json!("missing"))]))
            .await
            .unwrap_err();
        assert_eq!(error_code(err), 4001);

        let err = module
            .call::<_, Value>(
                method::SUBMIT,
                params(&[(
                    "request",
                    json!({"category": "web", "source": "generic", "url": "ftp://example.com"}),
                )]),
            )
            .await
            .unwrap_err();
        assert_eq!(error_code(err), 4000);

        // Missing jobId is a malformed call
        let err = module
            .call::<_, Value>(method::STATUS, ObjectParams::new())
            .await
            .unwrap_err();
        assert_eq!(error_code(err), jsonrpsee::types::error::INVALID_PARAMS_CODE);
    }

    #[test]
    fn test_default_config_binds_loopback() {
        let config = RpcServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_RPC_PORT);
        assert!(!config.cancel_on_disconnect);
    }
}
