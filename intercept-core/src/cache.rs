//! Web view cache mechanisms
//!
//! An embedded web view ships five client-side caching mechanisms. None of
//! them is implemented here; each is switched on by flipping flags on the
//! host's settings object, modelled by the [`WebSettings`] trait.
//!
//! | Mechanism        | Host flags                                   |
//! |------------------|----------------------------------------------|
//! | HTTP cache       | cache mode only, always built in             |
//! | Application Cache| path, max size, enabled                      |
//! | DOM Storage      | enabled                                      |
//! | Web SQL Database | path, enabled                                |
//! | IndexedDB        | follows the JavaScript flag                  |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::InterceptError;
use crate::Result;

/// Default Application Cache quota (20 MiB)
pub const DEFAULT_APP_CACHE_MAX_SIZE: u64 = 20 * 1024 * 1024;

/// How the built-in HTTP cache is consulted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HttpCacheMode {
    /// Honour Cache-Control / Expires / Last-Modified / ETag
    #[default]
    Default,
    /// Use any cached copy, even expired, before the network
    CacheElseNetwork,
    /// Always go to the network
    NoCache,
    /// Never go to the network
    CacheOnly,
}

/// Host settings sink
pub trait WebSettings {
    fn set_cache_mode(&mut self, mode: HttpCacheMode);

    fn set_app_cache_path(&mut self, path: &Path);
    fn set_app_cache_max_size(&mut self, bytes: u64);
    fn set_app_cache_enabled(&mut self, enabled: bool);
    /// Application Cache path previously set on this sink, if any
    fn app_cache_path(&self) -> Option<PathBuf>;
    /// Application Cache quota previously set on this sink, if any
    fn app_cache_max_size(&self) -> Option<u64>;

    fn set_dom_storage_enabled(&mut self, enabled: bool);

    fn set_database_path(&mut self, path: &Path);
    fn set_database_enabled(&mut self, enabled: bool);

    fn set_javascript_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCacheSettings {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_size: u64,
}

impl Default for AppCacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("cache"),
            max_size: DEFAULT_APP_CACHE_MAX_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("cache"),
        }
    }
}

/// Desired state of the five cache mechanisms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub http_cache: HttpCacheMode,
    pub app_cache: AppCacheSettings,
    pub dom_storage: bool,
    pub database: DatabaseSettings,
    pub indexed_db: bool,
}

impl CacheSettings {
    /// Every mechanism on, storing under `<files_dir>/cache`.
    pub fn all_enabled(files_dir: &Path) -> Self {
        let cache_dir = files_dir.join("cache");
        Self {
            http_cache: HttpCacheMode::Default,
            app_cache: AppCacheSettings {
                enabled: true,
                path: cache_dir.clone(),
                max_size: DEFAULT_APP_CACHE_MAX_SIZE,
            },
            dom_storage: true,
            database: DatabaseSettings {
                enabled: true,
                path: cache_dir,
            },
            indexed_db: true,
        }
    }

    /// Push these settings onto a host settings sink.
    ///
    /// The Application Cache path and quota can be set once per sink; a
    /// second application with different values is rejected.
    pub fn apply(&self, settings: &mut dyn WebSettings) -> Result<()> {
        settings.set_cache_mode(self.http_cache);

        if self.app_cache.enabled {
            self.apply_app_cache(settings)?;
        } else {
            settings.set_app_cache_enabled(false);
        }

        settings.set_dom_storage_enabled(self.dom_storage);

        if self.database.enabled {
            settings.set_database_path(&self.database.path);
            settings.set_database_enabled(true);
        } else {
            settings.set_database_enabled(false);
        }

        if self.indexed_db {
            settings.set_javascript_enabled(true);
        }

        info!(
            "Applied cache settings: http={:?} app_cache={} dom_storage={} database={} indexed_db={}",
            self.http_cache,
            self.app_cache.enabled,
            self.dom_storage,
            self.database.enabled,
            self.indexed_db
        );
        Ok(())
    }

    fn apply_app_cache(&self, settings: &mut dyn WebSettings) -> Result<()> {
        let wanted = &self.app_cache;

        match settings.app_cache_path() {
            Some(existing) if existing != wanted.path => {
                return Err(InterceptError::Configuration(format!(
                    "application cache path already set to {}",
                    existing.display()
                )));
            }
            Some(_) => debug!("Application cache path already set"),
            None => settings.set_app_cache_path(&wanted.path),
        }

        match settings.app_cache_max_size() {
            Some(existing) if existing != wanted.max_size => {
                return Err(InterceptError::Configuration(format!(
                    "application cache size already set to {} bytes",
                    existing
                )));
            }
            Some(_) => debug!("Application cache size already set"),
            None => settings.set_app_cache_max_size(wanted.max_size),
        }

        settings.set_app_cache_enabled(true);
        Ok(())
    }
}

/// In-memory settings sink that records every call in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordingWebSettings {
    pub cache_mode: HttpCacheMode,
    pub app_cache_path: Option<PathBuf>,
    pub app_cache_max_size: Option<u64>,
    pub app_cache_enabled: bool,
    pub dom_storage_enabled: bool,
    pub database_path: Option<PathBuf>,
    pub database_enabled: bool,
    pub javascript_enabled: bool,
    #[serde(skip)]
    pub calls: Vec<&'static str>,
}

impl RecordingWebSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WebSettings for RecordingWebSettings {
    fn set_cache_mode(&mut self, mode: HttpCacheMode) {
        self.calls.push("set_cache_mode");
        self.cache_mode = mode;
    }

    fn set_app_cache_path(&mut self, path: &Path) {
        self.calls.push("set_app_cache_path");
        self.app_cache_path = Some(path.to_path_buf());
    }

    fn set_app_cache_max_size(&mut self, bytes: u64) {
        self.calls.push("set_app_cache_max_size");
        self.app_cache_max_size = Some(bytes);
    }

    fn set_app_cache_enabled(&mut self, enabled: bool) {
        self.calls.push("set_app_cache_enabled");
        self.app_cache_enabled = enabled;
    }

    fn app_cache_path(&self) -> Option<PathBuf> {
        self.app_cache_path.clone()
    }

    fn app_cache_max_size(&self) -> Option<u64> {
        self.app_cache_max_size
    }

    fn set_dom_storage_enabled(&mut self, enabled: bool) {
        self.calls.push("set_dom_storage_enabled");
        self.dom_storage_enabled = enabled;
    }

    fn set_database_path(&mut self, path: &Path) {
        self.calls.push("set_database_path");
        self.database_path = Some(path.to_path_buf());
    }

    fn set_database_enabled(&mut self, enabled: bool) {
        self.calls.push("set_database_enabled");
        self.database_enabled = enabled;
    }

    fn set_javascript_enabled(&mut self, enabled: bool) {
        self.calls.push("set_javascript_enabled");
        self.javascript_enabled = enabled;
    }
}
