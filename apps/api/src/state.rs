use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::config::Config;
use crate::optimize::content::ContentGenerator;
use crate::optimize::gap_bullets::GapBulletSource;
use crate::optimize::options::OptionSource;
use crate::optimize::reducer::OptimizationState;
use crate::optimize::scoring::MatchScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable oracle seams. LLM-backed by default; stubbed in tests.
    pub scorer: Arc<dyn MatchScorer>,
    pub content: Arc<dyn ContentGenerator>,
    pub gap_bullets: Arc<dyn GapBulletSource>,
    pub option_source: Arc<dyn OptionSource>,
    /// Per-session optimization state, mutated only through the reducer.
    /// In-memory by design — document persistence lives with the editor.
    pub sessions: Arc<RwLock<HashMap<Uuid, OptimizationState>>>,
}
