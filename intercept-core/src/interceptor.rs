//! Resource Interceptor
//!
//! Decides, per outgoing resource request, whether to answer it with a
//! bundled asset instead of letting the host fetch it from the network.
//!
//! The decision is host-agnostic: hosts call [`ResourceInterceptor::intercept_url`]
//! or [`ResourceInterceptor::intercept_request`] from whatever hook they expose and
//! treat [`Interception::Unhandled`] and [`Interception::AssetUnavailable`] as
//! "continue with default loading".

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assets::AssetStore;
use crate::error::InterceptError;
use crate::request::ResourceRequest;
use crate::response::InterceptedResponse;
use crate::rules::{InterceptRule, RuleSet};

/// What to do when a rule matches but its asset cannot be opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetFailurePolicy {
    /// Let the request continue to the network as if no rule matched
    #[default]
    FallThrough,
    /// Answer with a body-less response, rendered by hosts as a broken resource
    Degrade,
}

impl FromStr for AssetFailurePolicy {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fall-through" => Ok(AssetFailurePolicy::FallThrough),
            "degrade" => Ok(AssetFailurePolicy::Degrade),
            other => Err(InterceptError::Configuration(format!(
                "unknown asset failure policy '{}' (expected fall-through or degrade)",
                other
            ))),
        }
    }
}

/// Outcome of an interception decision
#[derive(Debug)]
pub enum Interception {
    /// Serve this response instead of fetching
    Substitute(InterceptedResponse),
    /// No substitution; the host proceeds with default loading
    Unhandled,
    /// A rule matched but its asset could not be opened; default loading proceeds
    AssetUnavailable,
}

impl Interception {
    pub fn is_substitute(&self) -> bool {
        matches!(self, Interception::Substitute(_))
    }

    /// Whether the host should carry on with its own loading.
    pub fn defers_to_host(&self) -> bool {
        !self.is_substitute()
    }

    pub fn into_response(self) -> Option<InterceptedResponse> {
        match self {
            Interception::Substitute(response) => Some(response),
            Interception::Unhandled | Interception::AssetUnavailable => None,
        }
    }
}

/// Stateless interception decision over an immutable rule set and asset store
#[derive(Clone)]
pub struct ResourceInterceptor {
    rules: Arc<RuleSet>,
    assets: Arc<dyn AssetStore>,
    failure_policy: AssetFailurePolicy,
}

impl ResourceInterceptor {
    pub fn new(rules: RuleSet, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            rules: Arc::new(rules),
            assets,
            failure_policy: AssetFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: AssetFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn failure_policy(&self) -> AssetFailurePolicy {
        self.failure_policy
    }

    /// Match only, without opening any asset.
    pub fn classify(&self, url: &str) -> Option<&InterceptRule> {
        self.rules.classify(url)
    }

    /// Call shape taking the bare URL string.
    pub fn intercept_url(&self, url: &str) -> Interception {
        self.decide(url)
    }

    /// Call shape taking a full request descriptor. Method and headers are ignored.
    pub fn intercept_request(&self, request: &ResourceRequest) -> Interception {
        self.decide(request.url())
    }

    fn decide(&self, url: &str) -> Interception {
        let Some(rule) = self.rules.classify(url) else {
            debug!("No rule for {}, continuing with default loading", url);
            return Interception::Unhandled;
        };

        match self.assets.open(&rule.asset_path) {
            Ok(stream) => {
                info!(
                    "Substituting {} with asset {} ({})",
                    url, rule.asset_path, rule.mime_type
                );
                Interception::Substitute(InterceptedResponse::new(
                    rule.mime_type.clone(),
                    rule.encoding.clone(),
                    Some(stream),
                ))
            }
            Err(e) => {
                warn!("Failed to open asset for {}: {}", url, e);
                match self.failure_policy {
                    AssetFailurePolicy::FallThrough => Interception::AssetUnavailable,
                    AssetFailurePolicy::Degrade => Interception::Substitute(
                        InterceptedResponse::new(rule.mime_type.clone(), rule.encoding.clone(), None),
                    ),
                }
            }
        }
    }
}

impl std::fmt::Debug for ResourceInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceInterceptor")
            .field("rules", &self.rules)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetStore;
    use crate::rules::InterceptRule;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn interceptor() -> ResourceInterceptor {
        let store = MemoryAssetStore::new().with_asset("images/error.png", PNG);
        ResourceInterceptor::new(RuleSet::default(), Arc::new(store))
    }

    #[test]
    fn test_logo_gif_is_substituted() {
        let response = interceptor()
            .intercept_url("http://s.ip-cdn.com/img/logo.gif")
            .into_response()
            .expect("should substitute");

        assert_eq!(response.mime_type, "image/png");
        assert_eq!(response.encoding, "utf-8");
        assert_eq!(response.read_body().unwrap().as_deref(), Some(PNG));
    }

    #[test]
    fn test_other_urls_are_unhandled() {
        let interceptor = interceptor();
        assert!(!interceptor.intercept_url("http://ip.cn/").is_substitute());
        assert!(!interceptor
            .intercept_url("http://example.com/LOGO.GIF")
            .is_substitute());
    }

    #[test]
    fn test_call_shapes_agree() {
        let interceptor = interceptor();
        for url in [
            "http://s.ip-cdn.com/img/logo.gif",
            "http://ip.cn/",
            "http://example.com/LOGO.GIF",
            "https://cdn.test/logo.gif?x=1",
        ] {
            let request = ResourceRequest::get(url)
                .with_method("HEAD")
                .with_header("Accept", "image/*");
            assert_eq!(
                interceptor.intercept_url(url).is_substitute(),
                interceptor.intercept_request(&request).is_substitute(),
                "call shapes disagree for {}",
                url
            );
        }
    }

    #[test]
    fn test_repeated_calls_yield_independent_streams() {
        let interceptor = interceptor();
        let first = interceptor
            .intercept_url("http://s.ip-cdn.com/img/logo.gif")
            .into_response()
            .unwrap();
        let second = interceptor
            .intercept_url("http://s.ip-cdn.com/img/logo.gif")
            .into_response()
            .unwrap();

        // Drain the first completely before touching the second.
        assert_eq!(first.read_body().unwrap().as_deref(), Some(PNG));
        assert_eq!(second.read_body().unwrap().as_deref(), Some(PNG));
    }

    #[test]
    fn test_missing_asset_falls_through_by_default() {
        let interceptor = ResourceInterceptor::new(RuleSet::default(), Arc::new(MemoryAssetStore::new()));
        assert_eq!(interceptor.failure_policy(), AssetFailurePolicy::FallThrough);
        let outcome = interceptor.intercept_url("http://s.ip-cdn.com/img/logo.gif");
        assert!(matches!(outcome, Interception::AssetUnavailable));
        assert!(outcome.defers_to_host());
    }

    #[test]
    fn test_missing_asset_degrades_when_configured() {
        let interceptor = ResourceInterceptor::new(RuleSet::default(), Arc::new(MemoryAssetStore::new()))
            .with_failure_policy(AssetFailurePolicy::Degrade);

        let response = interceptor
            .intercept_url("http://s.ip-cdn.com/img/logo.gif")
            .into_response()
            .expect("degraded response expected");
        assert_eq!(response.mime_type, "image/png");
        assert!(!response.has_body());
    }

    #[test]
    fn test_escaping_asset_path_is_treated_as_missing() {
        let rules = RuleSet::new(vec![InterceptRule::new(
            "logo.gif",
            "image/png",
            "utf-8",
            "../outside.png",
        )]);
        let interceptor = ResourceInterceptor::new(rules, Arc::new(MemoryAssetStore::new()));
        assert!(!interceptor.intercept_url("http://a.test/logo.gif").is_substitute());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "degrade".parse::<AssetFailurePolicy>().unwrap(),
            AssetFailurePolicy::Degrade
        );
        assert_eq!(
            "fall-through".parse::<AssetFailurePolicy>().unwrap(),
            AssetFailurePolicy::FallThrough
        );
        assert!("explode".parse::<AssetFailurePolicy>().is_err());
    }
}
