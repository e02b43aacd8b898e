use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::session::{MemorySessionStore, SessionStore};
use crate::template::{Renderer, TemplateResult};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub renderer: Arc<Renderer>,
    pub sessions: Arc<dyn SessionStore>,
    pub start_time: Instant,
}

impl AppState {
    /// Compile the template cache and set up session storage.
    ///
    /// Fails if any template fails to compile; the server must not start
    /// with an incomplete cache.
    pub fn new(settings: Settings) -> TemplateResult<Self> {
        let renderer = Renderer::from_config(&settings.templates)?;
        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
            settings.session.lifetime_seconds,
        )));

        Ok(Self::with_parts(settings, renderer, sessions))
    }

    pub fn with_parts(
        settings: Settings,
        renderer: Renderer,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            renderer: Arc::new(renderer),
            sessions,
            start_time: Instant::now(),
        }
    }
}
