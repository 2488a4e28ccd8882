use std::sync::Arc;

use crate::config::Config;
use crate::generation::render::DocumentRenderer;
use crate::llm_client::CompletionBackend;
use crate::tasks::TaskStore;

/// Shared handles passed explicitly to the document pipeline.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionBackend>,
    pub tasks: TaskStore,
    /// Pluggable renderer. Default: OutlineFileRenderer into OUTPUT_DIR.
    pub renderer: Arc<dyn DocumentRenderer>,
    pub config: Config,
}
