//! The watch loop: filesystem events on the log's parent directory drive the
//! tail reader, and extracted events fan out to the presence store and the
//! notifier.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use joinwatch_notifier::{Notifier, message};
use joinwatch_presence::PresenceStore;
use notify::{Event, EventKind as FsEventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::extract::{EventKind, extract_event};
use crate::tail::TailReader;

/// Errors that terminate the watch loop.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("filesystem watch failed: {0}")]
    Notify(#[from] notify::Error),

    #[error("log path {0:?} has no parent directory or file name")]
    InvalidLogPath(PathBuf),

    #[error("filesystem event channel closed")]
    EventChannelClosed,
}

/// Tails the configured log file and dispatches join/leave notifications.
///
/// Runs until cancelled. A read error on the actively tailed file is
/// unrecoverable for the run and propagates out; notifier and persist
/// failures are logged and the loop continues.
pub struct WatchLoop<N> {
    path: PathBuf,
    tail: TailReader,
    presence: Arc<PresenceStore>,
    notifier: Arc<N>,
    cancel: CancellationToken,
}

impl<N: Notifier> WatchLoop<N> {
    pub fn new(
        path: PathBuf,
        presence: Arc<PresenceStore>,
        notifier: Arc<N>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tail: TailReader::new(path.clone()),
            path,
            presence,
            notifier,
            cancel,
        }
    }

    /// Runs the loop until cancellation or an unrecoverable error.
    pub async fn run(mut self) -> Result<(), WatchError> {
        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| WatchError::InvalidLogPath(self.path.clone()))?
            .to_path_buf();
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| WatchError::InvalidLogPath(self.path.clone()))?
            .to_os_string();

        // Watch the parent directory: a watch on the file path itself would
        // not survive delete+recreate. The notify callback runs on the
        // watcher's own thread, so bridging into the async loop blocks there,
        // not here.
        let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(256);
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.blocking_send(res);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        // Initial open is best-effort; a file that does not exist yet is
        // picked up by its create event.
        match self.tail.open() {
            Ok(()) => tracing::info!(file = %self.path.display(), "log file opened"),
            Err(e) => {
                tracing::warn!(file = %self.path.display(), "log file not yet readable: {e}")
            }
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.tail.close();
                    tracing::info!("watch loop stopped");
                    return Ok(());
                }

                event = rx.recv() => match event {
                    Some(Ok(event)) if is_relevant(&event, &file_name) => {
                        tracing::debug!(kind = ?event.kind, "filesystem event");
                        self.drain().await?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("watcher error: {e}");
                    }
                    None => return Err(WatchError::EventChannelClosed),
                },
            }
        }
    }

    /// Reopen-check, then drain complete lines until none remain.
    async fn drain(&mut self) -> Result<(), WatchError> {
        if let Err(e) = self.tail.reopen_if_changed() {
            tracing::warn!(file = %self.path.display(), "reopen check failed: {e}");
        }

        loop {
            let lines = self.tail.poll()?;
            if lines.is_empty() {
                return Ok(());
            }
            for line in &lines {
                self.process_line(line).await;
            }
        }
    }

    async fn process_line(&self, line: &str) {
        tracing::debug!(line, "checking log line");

        let Some(event) = extract_event(line) else {
            return;
        };

        // The presence mutation commits regardless of whether the
        // notification can be delivered.
        if let Err(e) = self
            .presence
            .apply(&event.name, event.kind == EventKind::Joined)
            .await
        {
            tracing::error!(player = %event.name, "failed to persist player list: {e}");
        }

        let now = Local::now();
        let text = match event.kind {
            EventKind::Joined => message::join_message(&event.name, now),
            EventKind::Left => message::leave_message(&event.name, now),
        };
        if let Err(e) = self.notifier.send(text).await {
            tracing::error!(player = %event.name, "notification failed: {e}");
        }
    }
}

/// An event is relevant when it targets the watched file's basename and is a
/// create, write, or rename (rename arrives as a modify of the name).
fn is_relevant(event: &Event, file_name: &OsStr) -> bool {
    matches!(
        event.kind,
        FsEventKind::Create(_) | FsEventKind::Modify(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinwatch_notifier::SendFuture;
    use std::future::Future;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Default)]
    struct MockNotifier {
        sent: tokio::sync::Mutex<Vec<String>>,
    }

    impl Notifier for MockNotifier {
        fn send(&self, text: String) -> SendFuture<'_> {
            Box::pin(async move {
                self.sent.lock().await.push(text);
                Ok(())
            })
        }
    }

    fn append(path: &Path, data: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(data.as_bytes()).unwrap();
    }

    async fn wait_for<F, Fut>(cond: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..50 {
            if cond().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("condition not met within 5s");
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        log: PathBuf,
        presence: Arc<PresenceStore>,
        notifier: Arc<MockNotifier>,
        cancel: CancellationToken,
    }

    async fn start_watch() -> (Fixture, tokio::task::JoinHandle<Result<(), WatchError>>) {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("latest.log");
        std::fs::write(&log, "").unwrap();

        let presence = Arc::new(PresenceStore::load(tmp.path().join("players.txt")).unwrap());
        let notifier = Arc::new(MockNotifier::default());
        let cancel = CancellationToken::new();

        let watch = WatchLoop::new(
            log.clone(),
            Arc::clone(&presence),
            Arc::clone(&notifier),
            cancel.clone(),
        );
        let handle = tokio::spawn(watch.run());

        // Give the directory watch time to register.
        tokio::time::sleep(Duration::from_millis(300)).await;

        let fixture = Fixture {
            _tmp: tmp,
            log,
            presence,
            notifier,
            cancel,
        };
        (fixture, handle)
    }

    #[tokio::test]
    async fn join_line_notifies_and_updates_presence() {
        let (fx, handle) = start_watch().await;

        append(
            &fx.log,
            "[15:57:19] [Server thread/INFO]: marcia2525dayo joined the game\n",
        );

        wait_for(|| async { !fx.notifier.sent.lock().await.is_empty() }).await;

        let sent = fx.notifier.sent.lock().await.clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("🟢 marcia2525dayo がサーバに参加しました"));
        assert_eq!(fx.presence.snapshot().await, vec!["marcia2525dayo"]);

        fx.cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn burst_is_notified_in_file_order() {
        let (fx, handle) = start_watch().await;

        append(
            &fx.log,
            "[10:00:01] [Server thread/INFO]: alice joined the game\n\
             [10:00:02] [Server thread/INFO]: bob joined the game\n\
             [10:00:03] [Server thread/INFO]: [Rcon: Automatic saving is now disabled]\n\
             [10:00:04] [Server thread/INFO]: alice left the game\n",
        );

        wait_for(|| async { fx.notifier.sent.lock().await.len() >= 3 }).await;

        let sent = fx.notifier.sent.lock().await.clone();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].starts_with("🟢 alice"));
        assert!(sent[1].starts_with("🟢 bob"));
        assert!(sent[2].starts_with("🔴 alice"));
        assert_eq!(fx.presence.snapshot().await, vec!["bob"]);

        fx.cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn irrelevant_lines_send_nothing() {
        let (fx, handle) = start_watch().await;

        append(&fx.log, "[10:00:01] [Server thread/INFO]: Saving the game\n");
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(fx.notifier.sent.lock().await.is_empty());
        assert!(fx.presence.snapshot().await.is_empty());

        fx.cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let (fx, handle) = start_watch().await;

        fx.cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("should stop")
            .expect("no panic");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_file_at_start_is_picked_up_on_create() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("latest.log");

        let presence = Arc::new(PresenceStore::load(tmp.path().join("players.txt")).unwrap());
        let notifier = Arc::new(MockNotifier::default());
        let cancel = CancellationToken::new();

        let watch = WatchLoop::new(
            log.clone(),
            Arc::clone(&presence),
            Arc::clone(&notifier),
            cancel.clone(),
        );
        let handle = tokio::spawn(watch.run());
        tokio::time::sleep(Duration::from_millis(300)).await;

        // The file appears after the loop started.
        std::fs::write(&log, "").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        append(&log, "[10:00:01] [Server thread/INFO]: late joined the game\n");

        wait_for(|| async { !notifier.sent.lock().await.is_empty() }).await;
        assert!(notifier.sent.lock().await[0].starts_with("🟢 late"));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
