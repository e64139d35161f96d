//! Configuration types for page-forge
//!
//! The configuration is an explicit value handed to the [`Pipeline`](crate::Pipeline)
//! at construction time. Nothing is read from process-wide state once a run starts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};
use utoipa::ToSchema;

/// Page generation settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PipelineConfig {
    /// Number of pages written per run (default: 10)
    #[serde(default = "default_page_count")]
    pub page_count: usize,

    /// Number of rows written to each page (default: 1000)
    #[serde(default = "default_row_count")]
    pub row_count: usize,

    /// Upper bound on pages written at the same time (default: available CPUs)
    ///
    /// The worker pool is sized `min(page_count, max_concurrent_pages)`.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,

    /// Keep the run folders after the run instead of removing them (default: false)
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_count: default_page_count(),
            row_count: default_row_count(),
            max_concurrent_pages: default_max_concurrent_pages(),
            keep_artifacts: false,
        }
    }
}

/// Working and output folder roots
///
/// Each run creates its own `<root>/<run_id>` subfolder under both roots.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FolderConfig {
    /// Root for page files (default: "./pages")
    #[serde(default = "default_pages_folder")]
    #[schema(value_type = String)]
    pub pages_folder: PathBuf,

    /// Root for merged export files (default: "./builds")
    #[serde(default = "default_builds_folder")]
    #[schema(value_type = String)]
    pub builds_folder: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            pages_folder: default_pages_folder(),
            builds_folder: default_builds_folder(),
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Page generation settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Working and output folders
    #[serde(default)]
    pub folders: FolderConfig,

    /// API server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check the configuration for values a run cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_pages == 0 {
            return Err(Error::Config {
                message: "max_concurrent_pages must be at least 1".to_string(),
                key: Some("max_concurrent_pages".to_string()),
            });
        }

        if self.folders.pages_folder == self.folders.builds_folder {
            return Err(Error::Config {
                message: format!(
                    "pages_folder and builds_folder must differ (both are '{}')",
                    self.folders.pages_folder.display()
                ),
                key: Some("builds_folder".to_string()),
            });
        }

        Ok(())
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_page_count() -> usize {
    10
}

fn default_row_count() -> usize {
    1000
}

fn default_max_concurrent_pages() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_pages_folder() -> PathBuf {
    PathBuf::from("./pages")
}

fn default_builds_folder() -> PathBuf {
    PathBuf::from("./builds")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
