//! Request pacing and 429 backpressure.

use std::time::Duration;

use tracing::warn;

/// Delay configuration for writes against the RDM API.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Gap observed after every successful request. RDM accepts about
    /// 5000 requests per hour, so the default keeps a sustained run under
    /// the limit.
    pub write_gap: Duration,
    /// Cooldown observed after an HTTP 429 before any further request.
    pub cooldown: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            write_gap: Duration::from_millis(800),
            cooldown: Duration::from_secs(15 * 60),
        }
    }
}

impl Pacing {
    /// No delays at all; only for tests.
    pub fn none() -> Self {
        Self {
            write_gap: Duration::ZERO,
            cooldown: Duration::ZERO,
        }
    }
}

/// Serves the pacing delays mandated by a response status.
#[derive(Debug, Clone)]
pub struct Pacer {
    pacing: Pacing,
}

impl Pacer {
    /// Create a pacer with the given configuration.
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Sleep as mandated by the response status.
    ///
    /// A 429 sleeps the full cooldown; the request that triggered it is
    /// still not-successful and the caller decides whether to retry. A
    /// success sleeps the write gap. Other failures return immediately.
    pub async fn after_response(&self, status: u16) {
        if status == 429 {
            warn!(
                cooldown_secs = self.pacing.cooldown.as_secs(),
                "RDM signalled backpressure, cooling down"
            );
            tokio::time::sleep(self.pacing.cooldown).await;
        } else if (200..300).contains(&status) {
            tokio::time::sleep(self.pacing.write_gap).await;
        }
    }
}
