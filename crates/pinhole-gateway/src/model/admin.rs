use pinhole_core::CleanupAction;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub action: CleanupAction,
}
