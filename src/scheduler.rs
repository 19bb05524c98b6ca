use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::{Errors, SchedulerReport};
use crate::lifecycle::LifecycleManager;

/// One scheduler pass: activate due auctions, then close expired ones.
pub async fn run_tick(manager: &LifecycleManager) -> Result<SchedulerReport, Errors> {
    let activated = manager.activate_scheduled().await?;
    let swept = manager.close_expired().await?;
    let report = SchedulerReport {
        activated: activated.activated_count,
        closed: swept.closed_count,
    };
    if report.activated > 0 || report.closed > 0 {
        info!(
            "scheduler tick: {} activated, {} closed",
            report.activated, report.closed
        );
    }
    Ok(report)
}

pub fn spawn_scheduler(manager: Arc<LifecycleManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if let Err(e) = run_tick(&manager).await {
                error!("scheduler tick failed: {}", e);
            }
        }
    })
}
