//! Composite renderer port - turns a batch into one labeled grid image.

use async_trait::async_trait;

use crate::domain::errors::RenderError;
use crate::domain::models::{Candidate, RenderResult};

#[async_trait]
pub trait CompositeRenderer: Send + Sync {
    /// Render `batch` into a grid.
    ///
    /// Candidates that fail to fetch or decode are left out, never replaced;
    /// the returned `candidates` list is the in-order subsequence that made it
    /// into the grid. `Ok(None)` means nothing rendered.
    async fn render(&self, batch: &[Candidate]) -> Result<Option<RenderResult>, RenderError>;
}
