//! Infrastructure implementation of the `UrlProbe` port.

use std::time::Duration;

use tracing::debug;

use crate::application::ports::UrlProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking `ureq` GET on the blocking pool.
pub struct HttpProbe {
    agent: ureq::Agent,
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(PROBE_TIMEOUT)
                .user_agent("dockhand-cli")
                .build(),
        }
    }
}

impl UrlProbe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        let agent = self.agent.clone();
        let target = url.to_string();
        let result = tokio::task::spawn_blocking(move || match agent.get(&target).call() {
            Ok(resp) => Ok(resp.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(e) => Err(e.to_string()),
        })
        .await;
        match result {
            Ok(Ok(status)) => {
                debug!(url, status, "probe answered");
                status < 400
            }
            Ok(Err(reason)) => {
                debug!(url, %reason, "probe failed");
                false
            }
            Err(_) => false,
        }
    }
}
