//! Background reachability check against the Ferrex server
//!
//! Feeds the [`ConnectionMonitor`] that the shell's connection gate reads.

use std::time::Duration;

use ferrex_web::{ConnectionMonitor, RequestContext, ResourcePath, api_routes::v1};
use tokio::task::JoinHandle;
use url::Url;

pub const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Check once and publish the outcome. Returns whether the server answered.
pub async fn probe_once(
    client: &reqwest::Client,
    api_base: &Url,
    monitor: &ConnectionMonitor,
) -> bool {
    let cx = RequestContext::new(api_base.clone());
    let url = match cx.api_url(&ResourcePath::parse(v1::server::INFO)) {
        Ok(url) => url,
        Err(err) => {
            monitor.report(format!("invalid API URL: {err}"));
            return false;
        }
    };

    let outcome = client.get(url).send().await;
    match outcome {
        Ok(response) if response.status().is_success() => {
            monitor.clear();
            true
        }
        Ok(response) => {
            let status = response.status();
            tracing::debug!(status = status.as_u16(), "health check rejected");
            monitor.report(format!("server answered with status {status}"));
            false
        }
        Err(err) => {
            tracing::debug!(error = %err, "health check failed");
            monitor.report(format!("server unreachable: {err}"));
            false
        }
    }
}

pub fn spawn_probe(
    client: reqwest::Client,
    api_base: Url,
    monitor: ConnectionMonitor,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            probe_once(&client, &api_base, &monitor).await;
        }
    })
}
