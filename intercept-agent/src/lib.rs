//! Intercept Agent
//!
//! Standalone executable that sits in front of a rendering surface as an
//! HTTP(S) proxy and substitutes bundled assets for matching resource requests.

use clap::{Parser, ValueEnum};
use intercept_core::{
    AssetFailurePolicy, CacheSettings, CertificateAuthority, InterceptError, InterceptProxy,
    InterceptStartupConfig, RecordingWebSettings,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON startup configuration; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on for HTTP/HTTPS traffic
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Port to listen on for HTTP/HTTPS traffic
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Port to expose the Admin API (health/metrics/rules)
    #[arg(long)]
    pub admin_port: Option<u16>,

    /// Directory holding the bundled assets (e.g. images/error.png)
    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// JSON file with interception rules
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Directory for the local root CA
    #[arg(long)]
    pub ca_dir: Option<PathBuf>,

    /// What to do when a matched asset cannot be opened
    #[arg(long, value_enum)]
    pub on_asset_failure: Option<FailurePolicyArg>,

    /// Application files directory holding cache storage
    #[arg(long)]
    pub files_dir: Option<PathBuf>,

    /// Cache mechanisms to enable on the rendering surface
    #[arg(long, value_enum)]
    pub cache_profile: Option<CacheProfile>,

    /// Print the cache settings that would be applied and exit
    #[arg(long, default_value_t = false)]
    pub print_cache_settings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicyArg {
    FallThrough,
    Degrade,
}

impl From<FailurePolicyArg> for AssetFailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::FallThrough => AssetFailurePolicy::FallThrough,
            FailurePolicyArg::Degrade => AssetFailurePolicy::Degrade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheProfile {
    /// Only the built-in HTTP cache, in its default mode
    Off,
    /// HTTP cache, Application Cache, DOM Storage, Web SQL Database and IndexedDB
    All,
}

impl CacheProfile {
    pub fn settings(self, files_dir: &Path) -> CacheSettings {
        match self {
            CacheProfile::Off => CacheSettings::default(),
            CacheProfile::All => CacheSettings::all_enabled(files_dir),
        }
    }
}

/// Merge the optional config file with command line overrides.
pub fn build_config(args: &Args) -> Result<InterceptStartupConfig, InterceptError> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => InterceptStartupConfig::default(),
    };

    if let Some(addr) = &args.listen_addr {
        config.listen_address = addr.clone();
    }
    if let Some(port) = args.listen_port {
        config.listen_port = port;
    }
    if let Some(port) = args.admin_port {
        config.admin_port = port;
    }
    if let Some(root) = &args.asset_root {
        config.asset_root = root.clone();
    }
    if let Some(rules) = &args.rules {
        config.rules_file = Some(rules.clone());
    }
    if let Some(dir) = &args.ca_dir {
        config.ca_dir = dir.clone();
    }
    if let Some(policy) = args.on_asset_failure {
        config.on_asset_failure = policy.into();
    }
    if let Some(dir) = &args.files_dir {
        config.files_dir = dir.clone();
    }
    if let Some(profile) = args.cache_profile {
        config.cache = profile.settings(&config.files_dir);
    }

    Ok(config)
}

/// Render the host settings a rendering surface would end up with.
pub fn render_cache_settings(settings: &CacheSettings) -> Result<String, InterceptError> {
    let mut sink = RecordingWebSettings::new();
    settings.apply(&mut sink)?;
    Ok(serde_json::to_string_pretty(&sink)?)
}

pub async fn run_agent(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Logging should be initialized by the caller (main or test)
    let config = build_config(&args)?;

    if args.print_cache_settings {
        println!("{}", render_cache_settings(&config.cache)?);
        return Ok(());
    }

    tracing::info!("Starting Intercept Agent...");
    tracing::info!("  Listen: {}:{}", config.listen_address, config.listen_port);
    tracing::info!("  Admin:  {}:{}", config.listen_address, config.admin_port);
    tracing::info!("  Assets: {}", config.asset_root.display());
    tracing::info!("  Asset failure policy: {:?}", config.on_asset_failure);

    let ca = CertificateAuthority::load_or_generate(&config.ca_dir)?;
    tracing::info!(
        "Rendering surface must trust {}",
        config.ca_dir.join("ca.pem").display()
    );

    let proxy = InterceptProxy::from_config(config, ca)?;
    proxy.run().await.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}
