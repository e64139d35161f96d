//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the page-forge REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the page-forge REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "page-forge REST API",
        version = "0.1.0",
        description = "Runs the concurrent page generation and merge pipeline and reports its progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Runs
        crate::api::routes::run_files,
        crate::api::routes::create_run,

        // System
        crate::api::routes::home,
        crate::api::routes::health_check,
        crate::api::routes::get_config,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::RunId,
        crate::types::Phase,
        crate::types::PageReport,
        crate::types::MergeReport,
        crate::types::PhaseTiming,
        crate::types::RunSummary,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::PipelineConfig,
        crate::config::FolderConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // Error types
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "runs", description = "Pipeline runs"),
        (name = "system", description = "Greeting, health, configuration, events and API documentation"),
    )
)]
pub struct ApiDoc;
