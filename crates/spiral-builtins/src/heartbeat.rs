// heartbeat.rs — Periodic `spiral.pulse` glints.
//
// The simplest long-lived module: activation spawns a timer task and
// returns. The task outlives the startup pass and is only aborted by `stop`.
// Consumers use the pulse to tell a live orchestrator from a dead one.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;

use spiral_orchestrator::{Module, ModuleContext, ModuleDescriptor};

pub const PULSE: &str = "spiral.pulse";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeartbeatOptions {
    pub interval_secs: u64,
    /// Takes precedence over `interval_secs` when set.
    pub interval_ms: Option<u64>,
}

impl Default for HeartbeatOptions {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            interval_ms: None,
        }
    }
}

impl HeartbeatOptions {
    pub fn interval(&self) -> Duration {
        match self.interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.interval_secs),
        }
    }
}

pub struct Heartbeat {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl Heartbeat {
    pub fn from_descriptor(descriptor: &ModuleDescriptor) -> anyhow::Result<Self> {
        let options: HeartbeatOptions = crate::options(descriptor)?;
        let interval = options.interval();
        if interval.is_zero() {
            anyhow::bail!("heartbeat interval must be greater than zero");
        }
        Ok(Self {
            interval,
            task: None,
        })
    }
}

#[async_trait]
impl Module for Heartbeat {
    async fn activate(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let glints = ctx.glints().clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut beat: u64 = 0;
            loop {
                ticker.tick().await;
                beat += 1;
                glints.emit_or_warn(PULSE, json!({ "beat": beat }));
            }
        }));
        tracing::info!(module = ctx.module_id(), interval_ms = interval.as_millis() as u64, "heartbeat started");
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}
