use crate::{
    admin::{start_admin_server, Metrics},
    assets::DirAssetStore,
    ca::CertificateAuthority,
    config::InterceptStartupConfig,
    error::InterceptError,
    handlers::InterceptHandler,
    interceptor::ResourceInterceptor,
    Result,
};
use hudsucker::{certificate_authority::RcgenAuthority, rustls, ProxyBuilder};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};

/// Intercepting proxy placed in front of a rendering surface
pub struct InterceptProxy {
    config: InterceptStartupConfig,
    ca: CertificateAuthority,
    interceptor: Arc<ResourceInterceptor>,
    metrics: Arc<Metrics>,
}

impl InterceptProxy {
    pub fn new(
        config: InterceptStartupConfig,
        ca: CertificateAuthority,
        interceptor: ResourceInterceptor,
    ) -> Self {
        Self {
            config,
            ca,
            interceptor: Arc::new(interceptor),
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Build the interceptor from the configured rules file and asset root.
    pub fn from_config(config: InterceptStartupConfig, ca: CertificateAuthority) -> Result<Self> {
        let rules = config.load_rules()?;
        info!(
            "Loaded {} interception rule(s), assets from {}",
            rules.len(),
            config.asset_root.display()
        );
        let interceptor = ResourceInterceptor::new(
            rules,
            Arc::new(DirAssetStore::new(config.asset_root.clone())),
        )
        .with_failure_policy(config.on_asset_failure);
        Ok(Self::new(config, ca, interceptor))
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ip: IpAddr = self.config.listen_address.parse().map_err(|e| {
            InterceptError::Configuration(format!(
                "Invalid listen address {}: {}",
                self.config.listen_address, e
            ))
        })?;
        let addr = SocketAddr::new(ip, self.config.listen_port);
        info!("Starting intercepting proxy on {}", addr);

        let admin_port = self.config.admin_port;
        let metrics = self.metrics.clone();
        let rules = Arc::new(self.interceptor.rules().clone());
        tokio::spawn(async move {
            if let Err(e) = start_admin_server(admin_port, metrics, rules).await {
                error!("Admin server failed: {}", e);
            }
        });

        let private_key = rustls::PrivateKey(self.ca.key_der());
        let ca_cert = rustls::Certificate(self.ca.cert_der()?);

        let authority = RcgenAuthority::new(private_key, ca_cert, 1000).map_err(|e| {
            InterceptError::Configuration(format!("Failed to create CA authority: {}", e))
        })?;

        let handler = InterceptHandler::new(self.interceptor.clone(), self.metrics.clone());

        let proxy = ProxyBuilder::new()
            .with_addr(addr)
            .with_rustls_client()
            .with_ca(authority)
            .with_http_handler(handler)
            .build();

        proxy
            .start(shutdown)
            .await
            .map_err(|e| InterceptError::Network(format!("Proxy failed: {}", e)))?;

        Ok(())
    }
}
