//! Command loader port.

use async_trait::async_trait;

use crate::dispatch::domain::LoadReport;

/// Source of command descriptors.
///
/// Loading never fails as a whole: sources that cannot be built are reported
/// in [`LoadReport::failures`] next to the descriptors that could.
#[async_trait]
pub trait CommandLoader: Send + Sync {
    /// Produces the current command set.
    async fn load(&self) -> LoadReport;
}
