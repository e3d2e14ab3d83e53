//! Intercept Core Library
//!
//! Host-agnostic resource interception for embedded web views: URL rules,
//! bundled asset stores and the substitution decision, plus the cache-mechanism
//! settings a rendering surface can be configured with. A proxy-based host
//! adapter puts the interceptor in front of any real rendering surface.

pub mod admin;
pub mod assets;
pub mod ca;
pub mod handlers;
/// Intercepting proxy server
pub mod proxy;
pub mod request;
pub mod response;

/// Substitution rules and first-match classification
pub mod rules;

/// Per-request interception decision
pub mod interceptor;

/// Web view cache mechanism settings
pub mod cache;

/// Configuration types and utilities
pub mod config;

/// Error types for interception operations
pub mod error;

pub use admin::{Metrics, MetricsSnapshot};
pub use assets::{AssetStore, AssetStream, DirAssetStore, MemoryAssetStore};
pub use ca::CertificateAuthority;
pub use cache::{CacheSettings, HttpCacheMode, RecordingWebSettings, WebSettings};
pub use config::InterceptStartupConfig;
pub use error::InterceptError;
pub use handlers::InterceptHandler;
pub use interceptor::{AssetFailurePolicy, Interception, ResourceInterceptor};
pub use proxy::InterceptProxy;
pub use request::ResourceRequest;
pub use response::InterceptedResponse;
pub use rules::{InterceptRule, RuleSet};

/// Result type alias for interception operations
pub type Result<T> = std::result::Result<T, InterceptError>;
