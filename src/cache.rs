use std::time::{Duration, SystemTime};
use tokio::time::Instant;

#[derive(Debug)]
pub struct CacheState {
    rendering: String,
    rendered_at: SystemTime,
    next_refresh_at: Instant,
    refreshing: bool,
}

impl CacheState {
    pub fn new(rendering: String, now: Instant, ttl: Duration) -> Self {
        CacheState {
            rendering,
            rendered_at: SystemTime::now(),
            next_refresh_at: now + ttl,
            refreshing: false,
        }
    }

    pub fn rendering(&self) -> &str {
        &self.rendering
    }

    pub fn rendered_at(&self) -> SystemTime {
        self.rendered_at
    }

    pub fn begin_refresh(&mut self, now: Instant) -> bool {
        if self.refreshing || now < self.next_refresh_at {
            return false;
        }
        self.refreshing = true;
        true
    }

    /// The next window opens one lifetime after the claim, success or failure.
    pub fn finish_refresh(&mut self, rendering: Option<String>, started_at: Instant, ttl: Duration) {
        if let Some(rendering) = rendering {
            self.rendering = rendering;
            self.rendered_at = SystemTime::now();
        }
        self.next_refresh_at = started_at + ttl;
        self.refreshing = false;
    }
}
