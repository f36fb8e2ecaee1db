use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info_span, Span};

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Monotonic id for one host request cycle.
pub fn generate_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Span covering one host request. Hooks and gateway calls made while it is
/// entered carry the `request_id` field.
pub fn create_request_span(request_id: u64, path: Option<&str>) -> Span {
    info_span!(
        "request",
        request_id = request_id,
        path = path.unwrap_or("-"),
        purged = tracing::field::Empty,
    )
}

pub fn create_stage_span(stage: &str) -> Span {
    info_span!(
        "stage",
        stage = stage,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Logs how long a stage took once dropped. Call [`StageTimer::fail`] to
/// record a failure instead of a success.
pub struct StageTimer {
    start: Instant,
    span: Span,
    failed: bool,
}

impl StageTimer {
    pub fn new(stage: &str) -> Self {
        let span = create_stage_span(stage);
        {
            let _enter = span.enter();
            tracing::debug!("stage started");
        }

        Self {
            start: Instant::now(),
            span,
            failed: false,
        }
    }

    pub fn fail(mut self, error: &str) {
        self.failed = true;
        let _enter = self.span.enter();
        self.span.record("status", "fail");
        tracing::warn!(error = error, "stage failed");
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;

        let _enter = self.span.enter();
        self.span.record("duration_ms", duration_ms);
        if !self.failed {
            self.span.record("status", "success");
            tracing::info!(duration_ms = duration_ms, "stage completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_increase() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert!(b > a);
    }
}
