use crate::{
    app::AppContext,
    config::Config,
    cors::build_cors_layer,
    health::health_routes,
    http::RouteModule,
    middleware::MakeRequestUuid,
    security::build_security_headers_layer,
    timeout::apply_timeout,
};
use axum::{Router, extract::DefaultBodyLimit};
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The HTTP server: routes, shared context and the middleware stack.
pub struct App {
    router: Router<AppContext>,
    config: Config,
    context: AppContext,
}

impl App {
    /// Creates an App serving `/health` plus any registered modules.
    pub fn new(config: Config, context: AppContext) -> Self {
        Self {
            router: health_routes(),
            config,
            context,
        }
    }

    /// Register a route module with the application
    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        let module_router = module.routes();
        if let Some(prefix) = module.prefix() {
            self.router = self.router.nest(prefix, module_router);
        } else {
            self.router = self.router.merge(module_router);
        }
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fully layered router with state applied.
    ///
    /// Used by `serve` and by in-process tests.
    pub fn into_router(self) -> Router {
        let config = self.config;
        let mut router = self.router;

        // Innermost first: each layer wraps everything added before it.
        router = router.layer(DefaultBodyLimit::max(config.server.max_body_size));

        router = apply_timeout(router, &config.timeout);

        if let Some(security_layer) = build_security_headers_layer(&config.security) {
            router = router.layer(security_layer);
        }

        if let Some(cors_layer) = build_cors_layer(&config.cors) {
            router = router.layer(cors_layer);
        }

        router = router
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        router.with_state(self.context)
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// The subscription store is closed after in-flight requests drain.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.server.addr()?;
        let store = self.context.store.clone();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Err(e) = store.close().await {
            tracing::warn!(error = %e, detail = %e.detail(), "Failed to close subscription store");
        }
        tracing::info!("Shutdown complete");

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
}
