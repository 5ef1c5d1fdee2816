use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::Service;

/// Fixed-window request limiter, applied at ingress ahead of
/// authentication. One window per client address, process-wide.
pub trait RateLimitService: Send + Sync {
    fn admit(&self, client: &str) -> bool;
}

impl Service {
    pub fn rate_limit_service(max_requests: u32, window: Duration) -> impl RateLimitService {
        Live::new(max_requests, window)
    }
}

struct Live {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, (Instant, u32)>>,
}

impl Live {
    fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimitService for Live {
    fn admit(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        let entry = windows.entry(client.to_string()).or_insert((now, 0));

        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        entry.1 += 1;
        entry.1 <= self.max_requests
    }
}
