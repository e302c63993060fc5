use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use lockwire_exec::{EventKind, prelude::*};
use lockwire_model::ErrorCode;
use tokio::sync::Notify;

fn fails(id: &'static str) -> Task {
    Task::new(id, id, |_ctx| async {
        Err::<Outcome<()>, _>(TaskError::new(ErrorCode::Timeout, "terminal did not answer"))
    })
}

fn counts(id: &'static str, hits: Arc<AtomicUsize>) -> Task {
    Task::new(id, id, move |_ctx| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::done(()))
        }
    })
}

#[tokio::test]
async fn results_flow_between_tasks() {
    let runner = TaskRunner::new(
        "chain",
        vec![
            Task::new("a", "Produce", |_ctx| async { Ok(Outcome::done(21u32)) }),
            Task::new("b", "Double", |ctx: TaskContext| async move {
                let a: u32 = ctx.result("a")?;
                Ok(Outcome::done(a * 2))
            }),
            Task::new("c", "Maybe", |ctx: TaskContext| async move {
                let b: u32 = ctx.result("b")?;
                if b > 100 {
                    Ok(Outcome::done(b))
                } else {
                    Ok(Outcome::skipped())
                }
            }),
        ],
    )
    .unwrap();

    let state = runner.execute(true).await.unwrap();

    assert_eq!(state, RunnerState::Succeeded);
    assert!(runner.is_successful());
    assert_eq!(runner.get_result::<u32>("b").unwrap(), 42);

    let snapshot = runner.snapshot();
    let statuses: Vec<_> = snapshot.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TaskStatus::Succeeded, TaskStatus::Succeeded, TaskStatus::Skipped]
    );
    assert!(matches!(
        runner.get_result::<u32>("c"),
        Err(RunnerError::InvalidArguments(_))
    ));
}

#[tokio::test]
async fn non_failable_failure_stops_the_pipeline() {
    let hits = Arc::new(AtomicUsize::new(0));
    let tasks = vec![fails("push"), counts("after", hits.clone())];
    let runner = TaskRunner::new("stop", tasks).unwrap();

    let state = runner.execute(false).await.unwrap();

    assert_eq!(state, RunnerState::Failed);
    assert!(!runner.is_successful());
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let snapshot = runner.snapshot();
    assert_eq!(snapshot[0].status, TaskStatus::Failed);
    assert_eq!(snapshot[0].code, Some(ErrorCode::Timeout));
    assert_eq!(snapshot[0].error.as_deref(), Some("terminal did not answer"));
    assert_eq!(snapshot[1].status, TaskStatus::Ready);
    assert!(matches!(
        runner.get_result::<()>("after"),
        Err(RunnerError::InvalidArguments(_))
    ));
}

#[tokio::test]
async fn throw_on_fail_returns_the_task_error() {
    let runner = TaskRunner::new("throw", vec![fails("push")]).unwrap();

    let err = runner.execute(true).await.unwrap_err();

    assert_eq!(
        err,
        RunnerError::TaskFailed {
            task: TaskId::from("push"),
            error: TaskError::new(ErrorCode::Timeout, "terminal did not answer"),
        }
    );
    assert_eq!(runner.state(), RunnerState::Failed);
}

#[tokio::test]
async fn failable_failure_continues() {
    let hits = Arc::new(AtomicUsize::new(0));
    let runner = TaskRunner::new(
        "soft",
        vec![fails("set-time").failable(), counts("after", hits.clone())],
    )
    .unwrap();

    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Succeeded);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(runner.snapshot()[0].status, TaskStatus::Failed);
}

#[tokio::test]
async fn failed_events_flag_failable_tasks() {
    let tasks = vec![fails("set-time").failable(), fails("push")];
    let runner = TaskRunner::new("flags", tasks).unwrap();
    let mut rx = runner.subscribe();

    assert_eq!(runner.execute(false).await.unwrap(), RunnerState::Failed);

    let mut failed = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::TaskFailed {
            failed.push((ev.task.clone(), ev.failable, ev.label.clone()));
        }
    }
    assert_eq!(
        failed,
        vec![
            (Some(TaskId::from("set-time")), true, None),
            (Some(TaskId::from("push")), false, None),
        ]
    );
}

#[tokio::test]
async fn explicit_failed_status_counts_as_failure() {
    let runner = TaskRunner::new(
        "explicit",
        vec![Task::new("self-test", "Self test", |_ctx| async { Ok(Outcome::failed(7u8)) })],
    )
    .unwrap();

    assert_eq!(runner.execute(false).await.unwrap(), RunnerState::Failed);
    assert_eq!(runner.snapshot()[0].code, Some(ErrorCode::TaskFailed));
    assert_eq!(runner.get_result::<u8>("self-test").unwrap(), 7);
}

#[tokio::test]
async fn wrong_result_type_is_invalid() {
    let runner = TaskRunner::new(
        "types",
        vec![Task::new("a", "A", |_ctx| async { Ok(Outcome::done(String::from("x"))) })],
    )
    .unwrap();
    runner.execute(true).await.unwrap();

    assert_eq!(runner.get_result::<String>("a").unwrap(), "x");
    assert!(matches!(
        runner.get_result::<u32>("a"),
        Err(RunnerError::InvalidArguments(_))
    ));
    assert!(matches!(
        runner.get_result::<String>("missing"),
        Err(RunnerError::InvalidArguments(_))
    ));
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let hits = Arc::new(AtomicUsize::new(0));
    let result = TaskRunner::new("dup", vec![counts("a", hits.clone()), counts("a", hits)]);
    assert!(matches!(result, Err(RunnerError::InvalidArguments(_))));
}

#[tokio::test]
async fn runner_executes_once() {
    let runner = TaskRunner::new("once", vec![]).unwrap();
    assert_eq!(runner.execute(false).await.unwrap(), RunnerState::Succeeded);
    assert!(matches!(
        runner.execute(false).await,
        Err(RunnerError::AlreadyStarted(_))
    ));
}

#[tokio::test]
async fn cancel_after_finish_is_a_noop() {
    let runner = TaskRunner::new("done", vec![]).unwrap();
    runner.execute(false).await.unwrap();

    assert!(!runner.cancel());
    assert_eq!(runner.state(), RunnerState::Succeeded);
}

#[tokio::test]
async fn cancel_mid_execution_runs_hook_and_stops() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let hooked = Arc::new(AtomicBool::new(false));
    let hits = Arc::new(AtomicUsize::new(0));

    let transfer = {
        let started = started.clone();
        let release = release.clone();
        let hook_release = release.clone();
        Task::new("transfer", "Transfer", move |ctx: TaskContext| {
            let started = started.clone();
            let release = release.clone();
            async move {
                started.notify_one();
                release.notified().await;
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                Ok(Outcome::done(()))
            }
        })
        .with_cancel_hook({
            let hooked = hooked.clone();
            let release = hook_release;
            move || {
                hooked.store(true, Ordering::SeqCst);
                release.notify_one();
            }
        })
    };

    let runner = TaskRunner::new("fw", vec![transfer, counts("commit", hits.clone())]).unwrap();
    let handle = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.execute(true).await })
    };

    started.notified().await;
    assert!(runner.cancel());
    assert!(!runner.cancel());

    let state = handle.await.unwrap().unwrap();
    assert_eq!(state, RunnerState::Cancelled);
    assert!(hooked.load(Ordering::SeqCst));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(runner.snapshot()[1].status, TaskStatus::Ready);
    assert!(!runner.cancel());
}

#[tokio::test]
async fn cancel_before_execute_starts_nothing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let runner = TaskRunner::new("early", vec![counts("a", hits.clone())]).unwrap();

    assert!(runner.cancel());
    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Cancelled);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn progress_and_events_are_published() {
    let runner = TaskRunner::new(
        "events",
        vec![Task::new("copy", "Copying", |ctx: TaskContext| async move {
            ctx.set_label("Copying 2 files");
            ctx.set_progress(0.5);
            ctx.set_progress(2.0);
            Ok(Outcome::done(()))
        })],
    )
    .unwrap();
    let mut rx = runner.subscribe();

    runner.execute(true).await.unwrap();

    let mut kinds = Vec::new();
    let mut last_seq = None;
    while let Ok(ev) = rx.try_recv() {
        if let Some(prev) = last_seq {
            assert!(ev.seq > prev);
        }
        last_seq = Some(ev.seq);
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::RunnerStarted,
            EventKind::TaskStarted,
            EventKind::TaskLabel,
            EventKind::TaskProgress,
            EventKind::TaskProgress,
            EventKind::TaskSucceeded,
            EventKind::RunnerSucceeded,
        ]
    );

    let info = &runner.snapshot()[0];
    assert_eq!(info.label, "Copying 2 files");
    assert_eq!(info.progress, Some(1.0));
}

#[tokio::test(start_paused = true)]
async fn tasks_never_overlap() {
    let running = Arc::new(AtomicUsize::new(0));
    let tasks = (0..3)
        .map(|i| {
            let running = running.clone();
            Task::new(format!("t{i}"), "step", move |_ctx| {
                let running = running.clone();
                async move {
                    assert_eq!(running.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(Outcome::done(i))
                }
            })
        })
        .collect();

    let runner = TaskRunner::new("serial", tasks).unwrap();
    assert_eq!(runner.execute(true).await.unwrap(), RunnerState::Succeeded);
    assert_eq!(runner.get_result::<i32>("t2").unwrap(), 2);
}
