//! Periodic push of rendered metrics to the telemetry platform.
//!
//! # Design Decisions
//! - Push, not scrape: the gateway exposes no metrics listener
//! - Failed pushes are logged and skipped; the next tick sends fresh totals
//! - Stopping performs one last push so the final interval is not lost

use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Content type of the Prometheus text exposition format.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Where and how to push.
#[derive(Clone)]
pub struct PushTarget {
    pub url: String,
    pub api_key: String,
    pub interval: Duration,
}

impl std::fmt::Debug for PushTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushTarget")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("interval", &self.interval)
            .finish()
    }
}

/// Background task pushing the exposition on a fixed interval.
#[derive(Debug)]
pub struct MetricsPusher {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MetricsPusher {
    /// Start pushing. Must be called inside a Tokio runtime.
    pub fn spawn(
        handle: PrometheusHandle,
        target: PushTarget,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(target.interval.max(Duration::from_secs(5)))
            .build()?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(run(client, handle, target, stop_rx));

        Ok(Self {
            stop: Some(stop_tx),
            task: Some(task),
        })
    }

    /// Stop the loop and wait for the final push.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Metrics push task failed");
            }
        }
    }
}

impl Drop for MetricsPusher {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn run(
    client: reqwest::Client,
    handle: PrometheusHandle,
    target: PushTarget,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(target.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    tracing::debug!(url = %target.url, interval = ?target.interval, "Metrics pusher started");

    loop {
        tokio::select! {
            _ = ticker.tick() => push(&client, &handle, &target).await,
            _ = &mut stop => break,
        }
    }

    push(&client, &handle, &target).await;
    tracing::debug!("Metrics pusher stopped");
}

async fn push(client: &reqwest::Client, handle: &PrometheusHandle, target: &PushTarget) {
    handle.run_upkeep();
    let body = handle.render();

    let result = client
        .post(&target.url)
        .header("api-key", &target.api_key)
        .header(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .and_then(|response| response.error_for_status());

    if let Err(e) = result {
        tracing::warn!(url = %target.url, error = %e, "Metrics push failed");
    }
}
