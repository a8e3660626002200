//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the server-info and database routes
//! - Wire up middleware (request start, request ID, tracing, admission,
//!   authentication, timeout, body limit)
//! - Run the idle-bucket sweeper and apply config reloads
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, GatewayConfig, RateLimitConfig};
use crate::database::{handlers, Backends};
use crate::host;
use crate::http::request::capture_request_start;
use crate::security::rate_limit::run_sweeper;
use crate::security::{
    api_key_middleware, rate_limit_middleware, AdmissionController, ApiKey, RateLimitState,
};

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    controller: Option<Arc<AdmissionController>>,
    api_key: ApiKey,
}

impl HttpServer {
    /// Create a server. `backends` supplies the engine implementations.
    ///
    /// The configuration is validated here as well as by the loader, since
    /// embedders may build it in code.
    pub fn new(config: GatewayConfig, backends: Backends) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let controller = if config.rate_limit.enabled {
            Some(Arc::new(AdmissionController::from_config(&config.rate_limit)?))
        } else {
            None
        };
        let api_key = ApiKey::new(config.auth.api_key.clone());

        tracing::info!(
            engines = ?backends.configured(),
            rate_limited = controller.is_some(),
            refill_rate = config.rate_limit.refill_rate,
            burst_capacity = config.rate_limit.burst_capacity,
            "Building router"
        );

        let router = Self::build_router(&config, &backends, controller.clone(), api_key.clone());
        Ok(Self {
            router,
            config,
            controller,
            api_key,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom on the way in. The request start is captured
    /// first so the envelope duration includes admission and authentication.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        backends: &Backends,
        controller: Option<Arc<AdmissionController>>,
        api_key: ApiKey,
    ) -> Router {
        let rate_limit = RateLimitState {
            controller,
            trusted_proxies: config.rate_limit.trusted_proxies.clone().into(),
        };

        Router::new()
            .route("/server-info", get(host::server_info))
            .merge(handlers::routes(backends))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(capture_request_start))
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn_with_state(
                        rate_limit,
                        rate_limit_middleware,
                    ))
                    .layer(middleware::from_fn_with_state(api_key, api_key_middleware))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .layer(DefaultBodyLimit::max(config.limits.max_body_bytes)),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configs received on `config_updates` rotate the API key.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(controller) = &self.controller {
            tokio::spawn(run_sweeper(
                controller.clone(),
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
                shutdown.resubscribe(),
            ));
        }

        tokio::spawn(apply_config_updates(
            self.api_key.clone(),
            self.config.rate_limit.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn api_key(&self) -> ApiKey {
        self.api_key.clone()
    }

    /// The admission controller, if rate limiting is enabled.
    pub fn admission_controller(&self) -> Option<Arc<AdmissionController>> {
        self.controller.clone()
    }
}

async fn apply_config_updates(
    api_key: ApiKey,
    active_rate_limit: RateLimitConfig,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    api_key.rotate(config.auth.api_key);
                    tracing::info!("API key reloaded");

                    if config.rate_limit != active_rate_limit {
                        tracing::warn!("Rate limit changes take effect after restart");
                    }
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}
