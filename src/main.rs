use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use harmoniface_core::{
    ContextRetriever, CoreConfig, NoteStructurer,
    config::{
        extractor_kind_from_env_value, index_source_from_env_values, min_score_from_env_value,
        timeout_from_env_value, top_k_from_env_value,
    },
    constants::{DEFAULT_EXTRACTION_TIMEOUT_MS, DEFAULT_RETRIEVAL_TIMEOUT_MS},
};

/// Main entry point for the HarmoniFace AI service
///
/// Resolves configuration from the environment once, builds the services and serves the REST
/// API (note structuring, health, OpenAPI/Swagger UI).
///
/// Retrieval is not served over HTTP. The context retriever is still built at startup so that a
/// bad knowledge directory or index URL stops the process before it accepts traffic; it is then
/// dropped.
///
/// # Environment Variables
/// - `HARMONIFACE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HARMONIFACE_EXTRACTOR`: `rules` (default) or `null`
/// - `HARMONIFACE_INDEX_URL`: base URL of a remote context index
/// - `HARMONIFACE_KNOWLEDGE_DIR`: directory of `.md`/`.txt` knowledge documents
/// - `HARMONIFACE_TOP_K`: chunks per retrieval (default: 5)
/// - `HARMONIFACE_MIN_SCORE`: minimum chunk relevance score
/// - `HARMONIFACE_EXTRACTION_TIMEOUT_MS` / `HARMONIFACE_RETRIEVAL_TIMEOUT_MS`: collaborator budgets
///
/// # Errors
/// Returns an error if configuration is invalid, the knowledge directory cannot be read, the
/// address cannot be bound, or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("harmoniface_run=info".parse()?)
                .add_directive("harmoniface_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config_from_env()?;
    let rest_addr =
        std::env::var("HARMONIFACE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let app = router(build_state(&cfg)?);

    tracing::info!("++ Starting HarmoniFace REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the REST state and checks that the configured context index can be opened.
fn build_state(cfg: &CoreConfig) -> anyhow::Result<AppState> {
    let structurer = NoteStructurer::from_config(cfg);
    tracing::info!("++ Using '{}' field extractor", structurer.extractor_name());

    let retriever = ContextRetriever::from_config(cfg)?;
    tracing::info!("++ Context index validated (top_k = {})", retriever.top_k());

    Ok(AppState::new(structurer))
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    let env = |name: &str| std::env::var(name).ok();

    let cfg = CoreConfig::new(
        extractor_kind_from_env_value(env("HARMONIFACE_EXTRACTOR"))?,
        index_source_from_env_values(
            env("HARMONIFACE_INDEX_URL"),
            env("HARMONIFACE_KNOWLEDGE_DIR"),
        ),
        top_k_from_env_value(env("HARMONIFACE_TOP_K"))?,
        min_score_from_env_value(env("HARMONIFACE_MIN_SCORE"))?,
        timeout_from_env_value(
            env("HARMONIFACE_EXTRACTION_TIMEOUT_MS"),
            DEFAULT_EXTRACTION_TIMEOUT_MS,
        )?,
        timeout_from_env_value(
            env("HARMONIFACE_RETRIEVAL_TIMEOUT_MS"),
            DEFAULT_RETRIEVAL_TIMEOUT_MS,
        )?,
    )?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmoniface_core::{ExtractorKind, IndexSource};
    use std::path::PathBuf;
    use std::time::Duration;

    fn cfg_with(index_source: IndexSource) -> CoreConfig {
        CoreConfig::new(
            ExtractorKind::RuleBased,
            index_source,
            5,
            None,
            Duration::from_millis(DEFAULT_EXTRACTION_TIMEOUT_MS),
            Duration::from_millis(DEFAULT_RETRIEVAL_TIMEOUT_MS),
        )
        .unwrap()
    }

    #[test]
    fn startup_accepts_empty_index() {
        assert!(build_state(&cfg_with(IndexSource::Empty)).is_ok());
    }

    #[test]
    fn startup_rejects_unreadable_knowledge_dir() {
        let missing = PathBuf::from("/nonexistent/harmoniface-knowledge");
        assert!(build_state(&cfg_with(IndexSource::KnowledgeDir(missing))).is_err());
    }

    #[test]
    fn startup_rejects_invalid_index_url() {
        let source = IndexSource::Remote("ftp://kb.local".into());
        assert!(build_state(&cfg_with(source)).is_err());
    }
}
