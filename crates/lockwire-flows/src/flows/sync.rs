use std::time::{SystemTime, UNIX_EPOCH};

use lockwire_exec::{Outcome, RunnerError, Task, TaskContext, TaskRunner};
use lockwire_model::{Action, DeviceId};
use tracing::debug;

use super::{FlowContext, tasks};
use crate::Credential;

impl FlowContext {
    /// Pipeline bringing one terminal up to date for `credential`:
    ///
    /// `refresh-tokens`* → `fetch-config` → `push-config` → `set-time`* →
    /// `read-events`* → `upload-events`* (* failable). `upload-events` is skipped
    /// when the terminal reported no events.
    pub fn synchronize_device(
        &self,
        device: &DeviceId,
        credential: &Credential,
    ) -> Result<TaskRunner, RunnerError> {
        TaskRunner::with_bus(
            format!("sync:{device}"),
            vec![
                self.refresh_tokens(device, credential),
                self.fetch_config(device),
                self.push_config(device),
                self.set_time(device),
                self.read_events(device),
                self.upload_events(device),
            ],
            self.bus.clone(),
        )
    }

    fn refresh_tokens(&self, device: &DeviceId, credential: &Credential) -> Task {
        let sync = self.credentials.clone();
        let device = device.clone();
        let credential = credential.clone();
        Task::new(tasks::REFRESH_TOKENS, "Refreshing credentials", move |_ctx| {
            let (sync, device, credential) = (sync.clone(), device.clone(), credential.clone());
            async move { Ok(Outcome::done(sync.refresh(&credential, &device).await?)) }
        })
        .failable()
    }

    fn fetch_config(&self, device: &DeviceId) -> Task {
        let remote = self.remote.clone();
        let device = device.clone();
        Task::new(tasks::FETCH_CONFIG, "Downloading configuration", move |_ctx| {
            let (remote, device) = (remote.clone(), device.clone());
            async move { Ok(Outcome::done(remote.fetch_device_config(&device).await?)) }
        })
    }

    fn push_config(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.session_timeout();
        Task::new(tasks::PUSH_CONFIG, "Writing configuration", move |ctx: TaskContext| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let config: Vec<u8> = ctx.result(tasks::FETCH_CONFIG)?;
                session
                    .run(&device, Action::SetConfig, Some(&config), timeout)
                    .await?;
                Ok(Outcome::done(()))
            }
        })
    }

    fn set_time(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.session_timeout();
        Task::new(tasks::SET_TIME, "Setting the clock", move |_ctx| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                session
                    .run(&device, Action::SetTime, Some(&now.to_be_bytes()), timeout)
                    .await?;
                Ok(Outcome::done(now))
            }
        })
        .failable()
    }

    fn read_events(&self, device: &DeviceId) -> Task {
        let session = self.session.clone();
        let device = device.clone();
        let timeout = self.config.session_timeout();
        Task::new(tasks::READ_EVENTS, "Reading the event log", move |_ctx| {
            let (session, device) = (session.clone(), device.clone());
            async move {
                let events = session.run(&device, Action::ReadEvents, None, timeout).await?;
                Ok(Outcome::done(events))
            }
        })
        .failable()
    }

    fn upload_events(&self, device: &DeviceId) -> Task {
        let remote = self.remote.clone();
        let device = device.clone();
        Task::new(tasks::UPLOAD_EVENTS, "Uploading the event log", move |ctx: TaskContext| {
            let (remote, device) = (remote.clone(), device.clone());
            async move {
                let events: Vec<u8> = ctx.result(tasks::READ_EVENTS).unwrap_or_default();
                if events.is_empty() {
                    debug!(%device, "no events to upload");
                    return Ok(Outcome::skipped());
                }
                remote.report_events(&device, &events).await?;
                Ok(Outcome::done(events.len()))
            }
        })
        .failable()
    }
}
