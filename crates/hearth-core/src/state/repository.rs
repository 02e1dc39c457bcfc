//! State repository trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::model::AppState;

/// Key under which the single companion session is persisted.
pub const SESSION_KEY: &str = "companion-app-state";

/// Durable key/value storage for the session aggregate.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Loads the aggregate stored under `key`, or `None` if nothing was saved yet.
    async fn load(&self, key: &str) -> Result<Option<AppState>>;

    /// Replaces the aggregate stored under `key`.
    async fn save(&self, key: &str, state: &AppState) -> Result<()>;
}
