//! Application state wiring all services together.
//!
//! AppState holds the concrete service instance used by the REST API.
//! The service is generic over repository/bridge traits, but AppState pins
//! it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parley_core::chat::service::ChatService;
use parley_infra::config::{load_inference_config, resolve_data_dir};
use parley_infra::infer::SubprocessBridge;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::pool::DatabasePool;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteConversationRepository, SubprocessBridge>;

/// Shared application state holding the chat service and database pool.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire the service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        // Wire the chat service: SQLite store + subprocess bridge
        let repo = SqliteConversationRepository::new(db_pool.clone());
        let inference = load_inference_config(&data_dir).await;
        tracing::info!(
            command = %inference.command,
            script = %inference.script.display(),
            timeout_secs = inference.timeout_secs,
            "Inference bridge configured"
        );
        let bridge = SubprocessBridge::new(
            &inference.command,
            &inference.script,
            Duration::from_secs(inference.timeout_secs),
        );
        let chat_service = ChatService::new(repo, bridge);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            data_dir,
            db_pool,
        })
    }
}
