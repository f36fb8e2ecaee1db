use crate::collector::PurgeSet;
use stackpurge_core::request_context::{create_request_span, generate_request_id};
use tracing::Span;

/// State owned by one host request. The host creates it when the request
/// starts and passes it to every [`crate::bus::EventBus::emit`] call.
#[derive(Debug)]
pub struct RequestContext {
    request_id: u64,
    span: Span,
    pub purge_set: PurgeSet,
}

impl RequestContext {
    pub fn new(path: Option<&str>) -> Self {
        let request_id = generate_request_id();
        Self {
            request_id,
            span: create_request_span(request_id, path),
            purge_set: PurgeSet::default(),
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
