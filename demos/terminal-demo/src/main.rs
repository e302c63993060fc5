//! Runs a device synchronization and a firmware update against a scripted terminal.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use lockwire_core::{
    DemoIdentity, MemoryDirectory, MemoryTokenStore, SessionContext, SignalBus, TerminalSession,
    mock::{FakeCodec, FakeTransport, Scripted},
};
use lockwire_exec::{Bus, Subscribe, SubscriberSet, TaskRunner};
use lockwire_flows::{Credential, FirmwareImage, FlowConfig, FlowContext, mock::MemoryRemote};
use lockwire_model::{Action, Device, DeviceId, Link, TerminalReply, ValidityWindow};
use lockwire_observe::{Journal, LoggerConfig, logger_init};
use lockwire_prometheus::PrometheusMetrics;
use tracing::info;

const DEVICE: &str = "demo-lock";
const CREDENTIAL: &str = "demo-credential";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    logger_init(&LoggerConfig {
        level: "info,lockwire_core=debug".into(),
        ..LoggerConfig::default()
    })?;

    // 2) Scripted terminal
    let bus = SignalBus::new();
    let transport = Arc::new(
        FakeTransport::new(bus.clone())
            .with_max_frame(48)
            .with_reply_delay(Duration::from_millis(20)),
    );
    transport.respond_with(|req| match req.token.command {
        Action::GetInfo => Scripted::Reply(TerminalReply::ok(b"1.4.0".to_vec())),
        Action::ReadEvents => {
            Scripted::Reply(TerminalReply::ok(b"07:58 open;08:02 close".to_vec()))
        }
        _ => Scripted::Reply(TerminalReply::ok(Vec::new())),
    });

    let directory = MemoryDirectory::new();
    directory.upsert(Device::new(DEVICE, "Demo lock", Link::Ble));

    // 3) Session
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let ctx = SessionContext::builder(
        bus,
        transport,
        Arc::new(directory),
        Arc::new(MemoryTokenStore::new()),
        Arc::new(FakeCodec),
    )
    .with_demo(DemoIdentity::new(DEVICE, CREDENTIAL, b"demo-private-key".to_vec()))
    .with_metrics(metrics.clone())
    .build();

    // 4) Backend
    let remote = Arc::new(MemoryRemote::new());
    remote.set_config(DEVICE, br#"{"schedule":"weekdays 07:00-19:00"}"#.to_vec());
    remote.publish_firmware(
        DEVICE,
        FirmwareImage {
            version: "1.5.0".into(),
            bytes: (0..=255u8).cycle().take(2048).collect(),
        },
    );

    // 5) Runner events
    let events = Bus::default();
    let listener = SubscriberSet::new(vec![
        Arc::new(Journal::new()) as Arc<dyn Subscribe>,
        metrics.clone() as Arc<dyn Subscribe>,
    ])
    .listen(events.subscribe());

    let flows = FlowContext::new(TerminalSession::new(ctx), remote)
        .with_config(FlowConfig {
            firmware_chunk: 256,
            ..FlowConfig::default()
        })
        .with_bus(events.clone());

    let device = DeviceId::from(DEVICE);
    let credential = Credential::new(
        CREDENTIAL,
        ValidityWindow::starting_at(SystemTime::now(), Duration::from_secs(24 * 3600)),
    );

    // 6) Workflows
    let sync = flows.synchronize_device(&device, &credential)?;
    let state = sync.execute(false).await?;
    info!(state = state.as_label(), "synchronization finished");
    print_snapshot(&sync)?;

    let firmware = flows.update_firmware(&device)?;
    let state = firmware.execute(false).await?;
    info!(state = state.as_label(), "firmware update finished");
    print_snapshot(&firmware)?;

    drop((sync, firmware, flows, events));
    listener.await?;

    println!("{}", metrics.encode_text()?);
    Ok(())
}

fn print_snapshot(runner: &TaskRunner) -> anyhow::Result<()> {
    println!("{}: {}", runner.name(), serde_json::to_string_pretty(&runner.snapshot())?);
    Ok(())
}
