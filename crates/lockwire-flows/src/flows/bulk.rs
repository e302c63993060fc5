use lockwire_exec::RunnerError;
use lockwire_model::{CredentialId, DeviceId, RunnerState, TaskInfo};
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::FlowContext;
use crate::Credential;

/// One device/credential pair to synchronize.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    pub device: DeviceId,
    pub credential: Credential,
}

/// Outcome of one synchronization in a bulk run.
#[derive(Debug, Clone)]
pub struct BulkReport {
    pub device: DeviceId,
    pub credential: CredentialId,
    pub state: Result<RunnerState, RunnerError>,
    pub tasks: Vec<TaskInfo>,
}

impl FlowContext {
    /// Runs one synchronization per target concurrently.
    ///
    /// Runners contend for the single terminal session; a runner that loses reports
    /// `Unavailable` on its terminal steps instead of waiting. Reports come back in
    /// target order.
    pub async fn bulk_sync(&self, targets: Vec<SyncTarget>) -> Vec<BulkReport> {
        let mut reports: Vec<(usize, BulkReport)> = Vec::with_capacity(targets.len());
        let mut set = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            match self.synchronize_device(&target.device, &target.credential) {
                Ok(runner) => {
                    set.spawn(async move {
                        let state = runner.execute(false).await;
                        let report = BulkReport {
                            device: target.device,
                            credential: target.credential.id,
                            state,
                            tasks: runner.snapshot(),
                        };
                        (index, report)
                    });
                }
                Err(e) => reports.push((
                    index,
                    BulkReport {
                        device: target.device,
                        credential: target.credential.id,
                        state: Err(e),
                        tasks: Vec::new(),
                    },
                )),
            }
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "bulk synchronization task did not finish"),
            }
        }

        reports.sort_by_key(|(index, _)| *index);
        let succeeded = reports
            .iter()
            .filter(|(_, r)| r.state == Ok(RunnerState::Succeeded))
            .count();
        info!(total = reports.len(), succeeded, "bulk synchronization finished");
        reports.into_iter().map(|(_, r)| r).collect()
    }
}
