use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use lockwire_core::{
    MemoryDirectory, MemoryTokenStore, NativeCodec, SessionContext, SignalBus, TerminalSession,
    mock::{FakeCodec, FakeTransport, Scripted},
};
use lockwire_flows::{
    Credential, FirmwareImage, FlowConfig, FlowContext, SyncTarget, TokenRefresh,
    mock::MemoryRemote, tasks,
};
use lockwire_model::{
    Action, AppStatus, CredentialId, Device, DeviceId, ErrorCode, Link, RunnerState, SignedToken,
    TaskStatus, TerminalReply, ValidityWindow,
};

struct Harness {
    transport: Arc<FakeTransport>,
    remote: Arc<MemoryRemote>,
    flows: FlowContext,
}

fn window() -> ValidityWindow {
    ValidityWindow::starting_at(
        SystemTime::now() - Duration::from_secs(60),
        Duration::from_secs(3600),
    )
}

fn credential(id: &str) -> Credential {
    Credential::new(id, window())
}

impl Harness {
    fn new(devices: &[&str]) -> Self {
        let bus = SignalBus::new();
        let transport = Arc::new(FakeTransport::new(bus.clone()).with_max_frame(128));
        let directory = MemoryDirectory::new();
        for id in devices {
            directory.upsert(Device::new(*id, *id, Link::Ble));
        }
        let ctx = SessionContext::builder(
            bus,
            transport.clone(),
            Arc::new(directory),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(FakeCodec),
        )
        .build();

        let remote = Arc::new(MemoryRemote::new());
        let flows =
            FlowContext::new(TerminalSession::new(ctx), remote.clone()).with_config(FlowConfig {
                firmware_chunk: 4,
                ..FlowConfig::default()
            });
        Self {
            transport,
            remote,
            flows,
        }
    }

    /// Lets the backend issue a maintenance token, which covers every action.
    fn issue_maintenance(&self, credential: &str, device: &str) {
        let token = SignedToken {
            credential_id: credential.into(),
            device_id: device.into(),
            command: Action::Maintenance,
            validity: window(),
            payload: Vec::new(),
            signature: b"sig".to_vec(),
        };
        let bytes = FakeCodec.encode_token(&token).unwrap();
        self.remote.issue(credential, device, Action::Maintenance, bytes);
    }

    fn commands(&self) -> Vec<Action> {
        self.transport.requests().iter().map(|r| r.token.command).collect()
    }
}

fn status_of(runner: &lockwire_exec::TaskRunner, id: &str) -> TaskStatus {
    runner
        .snapshot()
        .into_iter()
        .find(|t| t.id == *id)
        .map(|t| t.status)
        .unwrap()
}

#[tokio::test]
async fn synchronize_device_runs_every_step() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.remote.set_config("lock-1", b"schedule-v2".to_vec());
    h.transport.respond_with(|req| match req.token.command {
        Action::ReadEvents => Scripted::Reply(TerminalReply::ok(b"evt-1".to_vec())),
        _ => Scripted::Reply(TerminalReply::ok(Vec::new())),
    });

    let runner = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();
    let state = runner.execute(true).await.unwrap();

    assert_eq!(state, RunnerState::Succeeded);
    assert_eq!(
        runner.get_result::<TokenRefresh>(tasks::REFRESH_TOKENS).unwrap(),
        TokenRefresh::Refreshed(1)
    );
    assert_eq!(
        h.commands(),
        vec![Action::SetConfig, Action::SetTime, Action::ReadEvents]
    );
    assert_eq!(h.transport.requests()[0].token.payload, b"schedule-v2");
    assert_eq!(
        h.remote.reported(),
        vec![(DeviceId::from("lock-1"), b"evt-1".to_vec())]
    );
    assert_eq!(runner.get_result::<usize>(tasks::UPLOAD_EVENTS).unwrap(), 5);
}

#[tokio::test]
async fn empty_event_log_skips_upload() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.remote.set_config("lock-1", b"cfg".to_vec());

    let runner = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();
    runner.execute(true).await.unwrap();

    assert_eq!(status_of(&runner, tasks::UPLOAD_EVENTS), TaskStatus::Skipped);
    assert!(h.remote.reported().is_empty());
}

#[tokio::test]
async fn rejected_clock_does_not_abort_the_sync() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.remote.set_config("lock-1", b"cfg".to_vec());
    h.transport.respond_with(|req| match req.token.command {
        Action::SetTime => Scripted::Reply(TerminalReply::rejected(AppStatus(0x6985))),
        _ => Scripted::Reply(TerminalReply::ok(Vec::new())),
    });

    let runner = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();

    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Succeeded);
    let set_time = runner
        .snapshot()
        .into_iter()
        .find(|t| t.id == *tasks::SET_TIME)
        .unwrap();
    assert_eq!(set_time.status, TaskStatus::Failed);
    assert_eq!(set_time.code, Some(ErrorCode::ApplicationStatus));
}

#[tokio::test]
async fn missing_configuration_stops_before_touching_the_terminal() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");

    let runner = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();

    assert_eq!(runner.execute(false).await.unwrap(), RunnerState::Failed);
    assert_eq!(status_of(&runner, tasks::FETCH_CONFIG), TaskStatus::Failed);
    assert_eq!(status_of(&runner, tasks::PUSH_CONFIG), TaskStatus::Ready);
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn refused_credential_falls_back_to_cached_tokens() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.remote.set_config("lock-1", b"cfg".to_vec());
    let first = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();
    first.execute(true).await.unwrap();

    h.remote.refuse("cred-a");
    let second = h
        .flows
        .synchronize_device(&"lock-1".into(), &credential("cred-a"))
        .unwrap();

    assert_eq!(second.execute(true).await.unwrap(), RunnerState::Succeeded);
    assert_eq!(
        second.get_result::<TokenRefresh>(tasks::REFRESH_TOKENS).unwrap(),
        TokenRefresh::Cached
    );
}

#[tokio::test]
async fn firmware_up_to_date_skips_the_transfer() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.flows
        .credentials()
        .refresh(&credential("cred-a"), &"lock-1".into())
        .await
        .unwrap();
    h.remote.publish_firmware(
        "lock-1",
        FirmwareImage {
            version: "2.1.0".into(),
            bytes: vec![1; 10],
        },
    );
    h.transport.respond_with(|_| Scripted::Reply(TerminalReply::ok(b"2.1.0\n".to_vec())));

    let runner = h.flows.update_firmware(&"lock-1".into()).unwrap();

    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Succeeded);
    assert_eq!(status_of(&runner, tasks::CHECK_UPDATE), TaskStatus::Skipped);
    assert_eq!(status_of(&runner, tasks::TRANSFER), TaskStatus::Skipped);
    assert_eq!(status_of(&runner, tasks::COMMIT), TaskStatus::Skipped);
    assert_eq!(h.commands(), vec![Action::GetInfo]);
}

#[tokio::test]
async fn firmware_is_transferred_in_chunks() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.flows
        .credentials()
        .refresh(&credential("cred-a"), &"lock-1".into())
        .await
        .unwrap();
    h.remote.publish_firmware(
        "lock-1",
        FirmwareImage {
            version: "2.2.0".into(),
            bytes: (0u8..10).collect(),
        },
    );
    h.transport.respond_with(|req| match req.token.command {
        Action::GetInfo => Scripted::Reply(TerminalReply::ok(b"2.1.0".to_vec())),
        _ => Scripted::Reply(TerminalReply::ok(Vec::new())),
    });

    let runner = h.flows.update_firmware(&"lock-1".into()).unwrap();

    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Succeeded);
    assert_eq!(
        h.commands(),
        vec![
            Action::GetInfo,
            Action::FirmwareBegin,
            Action::FirmwareChunk,
            Action::FirmwareChunk,
            Action::FirmwareChunk,
            Action::FirmwareCommit,
        ]
    );
    let chunks: Vec<Vec<u8>> = h
        .transport
        .requests()
        .iter()
        .filter(|r| r.token.command == Action::FirmwareChunk)
        .map(|r| r.token.payload.clone())
        .collect();
    assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);

    let transfer = runner
        .snapshot()
        .into_iter()
        .find(|t| t.id == *tasks::TRANSFER)
        .unwrap();
    assert_eq!(transfer.progress, Some(1.0));
    assert_eq!(runner.get_result::<String>(tasks::COMMIT).unwrap(), "2.2.0");
}

#[tokio::test]
async fn cancelling_a_transfer_aborts_the_exchange_in_flight() {
    let h = Harness::new(&["lock-1"]);
    h.issue_maintenance("cred-a", "lock-1");
    h.flows
        .credentials()
        .refresh(&credential("cred-a"), &"lock-1".into())
        .await
        .unwrap();
    h.remote.publish_firmware(
        "lock-1",
        FirmwareImage {
            version: "3.0.0".into(),
            bytes: vec![9; 16],
        },
    );
    h.transport.respond_with(|req| match req.token.command {
        Action::GetInfo => Scripted::Reply(TerminalReply::ok(b"2.0.0".to_vec())),
        Action::FirmwareChunk => Scripted::Silence,
        _ => Scripted::Reply(TerminalReply::ok(Vec::new())),
    });

    let runner = h.flows.update_firmware(&"lock-1".into()).unwrap();
    let handle = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.execute(true).await })
    };
    while !h.commands().contains(&Action::FirmwareChunk) {
        tokio::task::yield_now().await;
    }

    assert!(runner.cancel());
    let state = handle.await.unwrap().unwrap();

    assert_eq!(state, RunnerState::Cancelled);
    assert_eq!(status_of(&runner, tasks::TRANSFER), TaskStatus::Failed);
    assert_eq!(status_of(&runner, tasks::COMMIT), TaskStatus::Ready);
    assert!(!h.flows.session().context().is_busy());
}

#[tokio::test]
async fn bulk_sync_contends_for_the_session() {
    let h = Harness::new(&["lock-1", "lock-2"]);
    for device in ["lock-1", "lock-2"] {
        h.issue_maintenance("cred-a", device);
        h.remote.set_config(device, b"cfg".to_vec());
    }

    let reports = h
        .flows
        .bulk_sync(vec![
            SyncTarget {
                device: "lock-1".into(),
                credential: credential("cred-a"),
            },
            SyncTarget {
                device: "lock-2".into(),
                credential: credential("cred-a"),
            },
        ])
        .await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].device, DeviceId::from("lock-1"));
    assert_eq!(reports[1].device, DeviceId::from("lock-2"));
    assert!(reports.iter().all(|r| r.credential == CredentialId::from("cred-a")));
    assert!(
        reports
            .iter()
            .any(|r| r.state == Ok(RunnerState::Succeeded))
    );
    for report in reports.iter().filter(|r| r.state != Ok(RunnerState::Succeeded)) {
        assert!(
            report
                .tasks
                .iter()
                .any(|t| t.code == Some(ErrorCode::Unavailable))
        );
    }
}
