use agtimeline_runtime::TimelineConfig;
use agtimeline_types::Snapshot;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::presentation::{ConsoleRenderer, TitledView};
use crate::types::OutputFormat;

/// Context for handler execution with consistent presentation utilities
pub struct HandlerContext {
    pub format: OutputFormat,
    pub config: TimelineConfig,
}

impl HandlerContext {
    pub fn new(format: OutputFormat, config: TimelineConfig) -> Self {
        Self { format, config }
    }

    /// Read and validate a snapshot file
    pub fn load_snapshot(&self, path: &Path) -> Result<Snapshot> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot = Snapshot::from_json_str(&content)
            .with_context(|| format!("invalid snapshot {}", path.display()))?;
        debug!(
            path = %path.display(),
            events = snapshot.events.len(),
            entities = snapshot.entities.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn render<T>(&self, view_model: T) -> Result<()>
    where
        T: TitledView,
    {
        ConsoleRenderer::new(self.format).render(view_model)
    }
}
