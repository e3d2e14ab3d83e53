//! Configuration types and utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::CacheSettings;
use crate::interceptor::AssetFailurePolicy;
use crate::rules::RuleSet;
use crate::Result;

/// Static startup configuration for the intercepting proxy.
/// These settings are set at startup and do not change during runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptStartupConfig {
    /// Address to listen on
    pub listen_address: String,
    /// Port to listen on
    pub listen_port: u16,
    /// Admin API port
    pub admin_port: u16,
    /// Directory holding the bundled assets
    pub asset_root: PathBuf,
    /// Optional JSON rules file; the built-in `logo.gif` rule is used when absent
    pub rules_file: Option<PathBuf>,
    /// Behaviour when a matched asset cannot be opened
    pub on_asset_failure: AssetFailurePolicy,
    /// Directory for the local root CA
    pub ca_dir: PathBuf,
    /// Application files directory; cache storage lives under `<files_dir>/cache`
    pub files_dir: PathBuf,
    /// Cache mechanisms to enable on the rendering surface
    pub cache: CacheSettings,
}

impl Default for InterceptStartupConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            listen_port: 8080,
            admin_port: 9091,
            asset_root: PathBuf::from("./assets"),
            rules_file: None,
            on_asset_failure: AssetFailurePolicy::default(),
            ca_dir: PathBuf::from("./certs"),
            files_dir: PathBuf::from("./files"),
            cache: CacheSettings::default(),
        }
    }
}

impl InterceptStartupConfig {
    /// Resolve the rule set: the rules file when configured, otherwise the default rule.
    pub fn load_rules(&self) -> Result<RuleSet> {
        match &self.rules_file {
            Some(path) => RuleSet::from_json_file(path),
            None => Ok(RuleSet::default()),
        }
    }
}
