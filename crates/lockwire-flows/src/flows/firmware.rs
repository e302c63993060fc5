use lockwire_exec::{Outcome, RunnerError, Task, TaskContext, TaskError, TaskRunner};
use lockwire_model::{Action, DeviceId, ErrorCode};
use tracing::{debug, info};

use super::{FlowContext, tasks};
use crate::FirmwareImage;

impl FlowContext {
    /// Pipeline updating a terminal's firmware:
    ///
    /// `read-info` → `check-update` → `transfer` → `commit`. Everything after
    /// `check-update` is skipped when the terminal already runs the published version.
    /// Cancelling the runner aborts the chunk exchange in flight.
    pub fn update_firmware(&self, device: &DeviceId) -> Result<TaskRunner, RunnerError> {
        TaskRunner::with_bus(
            format!("firmware:{device}"),
            vec![
                self.read_info(device),
                self.check_update(device),
                self.transfer(device),
                self.commit(device),
            ],
            self.bus.clone(),
        )
    }

    fn read_info(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.session_timeout();
        Task::new(tasks::READ_INFO, "Reading device information", move |_ctx| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let info = session.run(&device, Action::GetInfo, None, timeout).await?;
                let version = String::from_utf8_lossy(&info).trim().to_string();
                debug!(%device, %version, "installed firmware");
                Ok(Outcome::done(version))
            }
        })
    }

    fn check_update(&self, device: &DeviceId) -> Task {
        let remote = self.remote.clone();
        let device = device.clone();
        Task::new(tasks::CHECK_UPDATE, "Checking for updates", move |ctx: TaskContext| {
            let (remote, device) = (remote.clone(), device.clone());
            async move {
                let installed: String = ctx.result(tasks::READ_INFO)?;
                match remote.fetch_firmware(&device).await? {
                    Some(image) if image.version != installed => {
                        info!(
                            %device,
                            from = %installed,
                            to = %image.version,
                            "firmware update available"
                        );
                        Ok(Outcome::done(image))
                    }
                    _ => Ok(Outcome::skipped()),
                }
            }
        })
    }

    fn transfer(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.firmware_timeout();
        let chunk = self.config.firmware_chunk;

        let bus = self.session.context().bus().clone();
        let group = device.to_string();

        Task::new(tasks::TRANSFER, "Transferring firmware", move |ctx: TaskContext| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let Ok(image) = ctx.result::<FirmwareImage>(tasks::CHECK_UPDATE) else {
                    return Ok(Outcome::skipped());
                };
                if chunk == 0 {
                    let reason = "firmware chunk size is zero";
                    return Err(TaskError::new(ErrorCode::InvalidArguments, reason));
                }

                let header = format!("{}:{}", image.version, image.bytes.len());
                session
                    .run(&device, Action::FirmwareBegin, Some(header.as_bytes()), timeout)
                    .await?;

                let total = image.bytes.len().div_ceil(chunk);
                for (n, part) in image.bytes.chunks(chunk).enumerate() {
                    if ctx.is_cancelled() {
                        return Err(TaskError::Canceled);
                    }
                    session
                        .run(&device, Action::FirmwareChunk, Some(part), timeout)
                        .await?;
                    ctx.set_progress((n + 1) as f32 / total as f32);
                }
                ctx.set_progress(1.0);
                Ok(Outcome::done(image.version))
            }
        })
        .with_cancel_hook(move || {
            bus.abort_group(&group);
        })
    }

    fn commit(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.firmware_timeout();
        Task::new(tasks::COMMIT, "Activating firmware", move |ctx: TaskContext| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let Ok(version) = ctx.result::<String>(tasks::TRANSFER) else {
                    return Ok(Outcome::skipped());
                };
                session
                    .run(&device, Action::FirmwareCommit, Some(version.as_bytes()), timeout)
                    .await?;
                info!(%device, %version, "firmware committed");
                Ok(Outcome::done(version))
            }
        })
    }
}
