use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// Reachability check for an external host.
#[async_trait]
pub trait HostProbe: Send + Sync {
    async fn ping(&self, host: &str) -> bool;
}

/// One ICMP echo via the system `ping` binary (Linux flags).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemPing;

#[async_trait]
impl HostProbe for SystemPing {
    async fn ping(&self, host: &str) -> bool {
        // Never let a "host" be parsed as a ping option.
        if host.is_empty() || host.starts_with('-') {
            return false;
        }

        match Command::new("ping")
            .args(["-c", "1", "-W", "2", host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to run ping");
                false
            }
        }
    }
}
