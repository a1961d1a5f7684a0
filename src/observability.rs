use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("querychat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("querychat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("querychat.client.request_duration_seconds");

pub(crate) static SESSION_SUBMISSIONS: Counter = Counter::new("querychat.session.submissions");
pub(crate) static SESSION_REJECTED: Counter = Counter::new("querychat.session.rejected");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("querychat.session.failures");

pub(crate) static REVEAL_STARTED: Counter = Counter::new("querychat.reveal.started");
pub(crate) static REVEAL_TICKS: Counter = Counter::new("querychat.reveal.ticks");
pub(crate) static REVEAL_CANCELLED: Counter = Counter::new("querychat.reveal.cancelled");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_SUBMISSIONS);
    collector.register_counter(&SESSION_REJECTED);
    collector.register_counter(&SESSION_FAILURES);

    collector.register_counter(&REVEAL_STARTED);
    collector.register_counter(&REVEAL_TICKS);
    collector.register_counter(&REVEAL_CANCELLED);
}
