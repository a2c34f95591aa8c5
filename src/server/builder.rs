//! ServerBuilder for fluent API to build the invoice HTTP server

use super::handlers::AppState;
use super::router::build_router;
use crate::config::{DocumentFormat, InvoicingConfig, StorageBackend};
use crate::core::auth::{AuthProvider, HeaderAuthProvider};
use crate::core::service::InvoiceService;
use crate::core::store::{ArtifactStore, InvoiceStore};
use crate::render::{DocumentRenderer, DocumentTemplate, PdfRenderer, TextRenderer};
use crate::storage::{FsArtifactStore, InMemoryInvoiceStore};
use anyhow::Result;
use axum::Router;
use axum::http::header::{self, HeaderName, HeaderValue};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Builder for the invoice server
///
/// Every collaborator not set explicitly is derived from the configuration:
/// the record store from `storage`, the renderer and artifact directory from
/// `documents`, the identity header from `auth`.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_store(InMemoryInvoiceStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: InvoicingConfig,
    store: Option<Arc<dyn InvoiceStore>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
    auth: Option<Arc<dyn AuthProvider>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            config: InvoicingConfig::default(),
            store: None,
            renderer: None,
            artifacts: None,
            auth: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: InvoicingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the invoice record store
    pub fn with_store(mut self, store: impl InvoiceStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the document renderer
    pub fn with_renderer(mut self, renderer: impl DocumentRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Set the artifact store
    pub fn with_artifact_store(mut self, artifacts: impl ArtifactStore + 'static) -> Self {
        self.artifacts = Some(Arc::new(artifacts));
        self
    }

    /// Set the identity provider
    pub fn with_auth_provider(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Add custom routes to the server, merged at the root
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    pub fn config(&self) -> &InvoicingConfig {
        &self.config
    }

    /// Build the invoice service alone, without HTTP
    pub fn build_service(&self) -> Result<InvoiceService> {
        self.config.validate()?;

        let store = match &self.store {
            Some(store) => store.clone(),
            None => self.default_store()?,
        };
        let renderer = match &self.renderer {
            Some(renderer) => renderer.clone(),
            None => self.default_renderer()?,
        };
        let artifacts: Arc<dyn ArtifactStore> = match &self.artifacts {
            Some(artifacts) => artifacts.clone(),
            None => Arc::new(FsArtifactStore::new(self.config.documents.directory.clone())),
        };

        Ok(InvoiceService::new(store, renderer, artifacts)
            .with_settings(self.config.service_settings()))
    }

    fn default_store(&self) -> Result<Arc<dyn InvoiceStore>> {
        match self.config.storage.backend {
            StorageBackend::Memory => Ok(Arc::new(InMemoryInvoiceStore::new())),
            #[cfg(feature = "lmdb")]
            StorageBackend::Lmdb => Ok(Arc::new(crate::storage::LmdbInvoiceStore::open(
                &self.config.storage.path,
            )?)),
            #[cfg(not(feature = "lmdb"))]
            StorageBackend::Lmdb => Err(anyhow::anyhow!(
                "storage.backend is 'lmdb' but the 'lmdb' feature is not enabled"
            )),
        }
    }

    fn default_renderer(&self) -> Result<Arc<dyn DocumentRenderer>> {
        let template = match &self.config.documents.template {
            Some(path) => DocumentTemplate::from_file(path)?,
            None => DocumentTemplate::builtin()?,
        };

        Ok(match self.config.documents.format {
            DocumentFormat::Pdf => Arc::new(PdfRenderer::new(template)),
            DocumentFormat::Text => Arc::new(TextRenderer::new(template)),
        })
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let service = self.build_service()?;
        let auth = self.auth.take().unwrap_or_else(|| {
            Arc::new(HeaderAuthProvider::new(self.config.auth.user_header.clone()))
        });

        let state = AppState {
            service: Arc::new(service),
            auth,
        };

        let mut app = build_router(state, &self.config.server.api_prefix);
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        if self.config.server.cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.server.security_headers {
            for (name, value) in security_headers() {
                app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
            }
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to `server.host:server.port`
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.address();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response hardening headers, the same set a browser-facing gateway would add
fn security_headers() -> [(HeaderName, HeaderValue); 10] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; base-uri 'self'; frame-ancestors 'self'; object-src 'none'",
            ),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        // 0 switches off the legacy browser XSS auditor
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ]
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
