/// Public library interface for the Rest Cycle MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod domain;
pub mod storage;
pub mod analytics;
pub mod tools;
pub mod mcp;

// Re-export public modules and types
pub use domain::*;
pub use storage::{SqliteStorage, StorageError, SleepStorage};
pub use analytics::{
    AnalysisOutcome, AnalyticsEngine, InMemoryInsightCache, InsightOrchestrator, InsightPayload,
    InsightResponse, InsightSource, SleepAnalysis,
};

use analytics::advisor::{advisor_from_env, Advisor, DEFAULT_ADVISOR_TIMEOUT};
use analytics::cache::DEFAULT_CACHE_TTL;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for the insight engine
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    /// How long generated insights are served from cache
    pub cache_ttl: Duration,
    /// Deadline for a single advisor call
    pub advisor_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            advisor_timeout: DEFAULT_ADVISOR_TIMEOUT,
        }
    }
}

/// Main sleep coaching server that implements the MCP protocol
///
/// This server keeps sleep records in a SQLite database and owns the insight
/// orchestrator (with its process-wide cache) shared by every insight request.
pub struct RestCycleServer {
    storage: SqliteStorage,
    orchestrator: InsightOrchestrator,
}

impl RestCycleServer {
    /// Create a new server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema if
    /// it doesn't already exist, and pick the advisor from the environment.
    pub async fn new(db_path: PathBuf, settings: ServerSettings) -> Result<Self, ServerError> {
        let advisor = advisor_from_env(settings.advisor_timeout);
        Self::with_advisor(db_path, settings, advisor)
    }

    /// Create a server with an explicit advisor instead of reading the environment
    pub fn with_advisor(
        db_path: PathBuf,
        settings: ServerSettings,
        advisor: Arc<dyn Advisor>,
    ) -> Result<Self, ServerError> {
        tracing::info!("Initializing Rest Cycle server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        let cache = Arc::new(InMemoryInsightCache::with_ttl(settings.cache_ttl));
        let orchestrator = InsightOrchestrator::new(advisor, cache);

        Ok(Self { storage, orchestrator })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Get a reference to the insight orchestrator (useful for testing)
    pub fn orchestrator(&self) -> &InsightOrchestrator {
        &self.orchestrator
    }
}
