use crate::error::ShortenerError;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// What an administrative cleanup does with expired records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupAction {
    /// Only count the expired records.
    Mark,
    /// Delete the expired records.
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub action: CleanupAction,
    /// Records found (`Mark`) or removed (`Delete`).
    pub count: usize,
}

/// Administrative sweep over time-expired records.
///
/// Never invoked from the resolution path.
#[async_trait]
pub trait Sweeper: Send + Sync + 'static {
    async fn sweep(
        &self,
        action: CleanupAction,
        now: Timestamp,
    ) -> Result<CleanupReport, ShortenerError>;
}
