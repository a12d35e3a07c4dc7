//! Integration tests for background work delivered back to an owner thread.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rowsync_core::{Dispatcher, Signal, ThreadAffinity, WorkerBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
enum Message {
    Done { generation: u64, rows: usize },
}

#[test]
fn worker_results_are_applied_on_owner_thread() {
    init_tracing();
    let owner = ThreadAffinity::current();
    let dispatcher = Dispatcher::<Message>::new();
    let worker = WorkerBuilder::new()
        .name("integration-refetch")
        .queue_capacity(4)
        .build::<usize>()
        .unwrap();

    for generation in 1..=3u64 {
        let handle = dispatcher.handle();
        worker
            .send_with_callback(
                move || generation as usize * 10,
                move |rows| {
                    let _ = handle.post(Message::Done { generation, rows });
                },
            )
            .unwrap();
    }

    assert!(worker.wait_idle(Duration::from_secs(5)));

    let applied = Arc::new(Mutex::new(Vec::new()));
    for message in dispatcher.drain() {
        owner.assert_same_thread();
        applied.lock().push(message);
    }

    assert_eq!(
        *applied.lock(),
        vec![
            Message::Done { generation: 1, rows: 10 },
            Message::Done { generation: 2, rows: 20 },
            Message::Done { generation: 3, rows: 30 },
        ]
    );
    assert!(worker.stop_and_join());
}

#[test]
fn signal_slot_can_forward_to_dispatcher() {
    let dispatcher = Dispatcher::<String>::new();
    let signal = Arc::new(Signal::<String>::new());

    let handle = dispatcher.handle();
    signal.connect(move |text| {
        let _ = handle.post(text.clone());
    });

    let emitter = signal.clone();
    std::thread::spawn(move || {
        emitter.emit("from another thread".to_string());
    })
    .join()
    .unwrap();

    assert_eq!(dispatcher.drain(), vec!["from another thread".to_string()]);
}

#[test]
fn worker_lifecycle_is_logged_under_the_worker_target() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("rowsync_core::worker=debug"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let worker = WorkerBuilder::new()
            .name("logged-worker")
            .build::<()>()
            .unwrap();
        worker.stop();
    });

    let output = captured.text();
    assert!(output.contains("rowsync_core::worker"), "{output}");
    assert!(output.contains("worker started"), "{output}");
    assert!(output.contains("logged-worker"), "{output}");
    assert!(output.contains("worker stop requested"), "{output}");
}
