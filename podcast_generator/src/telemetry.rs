/// Fire-and-forget pipeline telemetry. A sink must never fail the run.
pub trait TelemetrySink {
    fn podcast_created(&self, artifact_id: &str, user_id: &str, duration: f64);
}

/// Emits structured tracing events, which the log pipeline picks up.
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn podcast_created(&self, artifact_id: &str, user_id: &str, duration: f64) {
        tracing::info!(
            event = "podcast_created",
            artifact_id,
            user_id,
            duration,
            "podcast created"
        );
    }
}
