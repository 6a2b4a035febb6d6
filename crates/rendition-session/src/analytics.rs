use rendition_abr::SessionSummary;

/// Receives the final summary of every destroyed session.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = AnalyticsSinkMock)
)]
pub trait AnalyticsSink: Send + Sync + 'static {
    fn record_session(&self, summary: SessionSummary);
}

/// Sink that drops every summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record_session(&self, _summary: SessionSummary) {}
}
