// writer.rs — Write-behind persistence for one session.
//
// Producers (command scopes, scope checkpoints) push finished records onto a
// bounded channel. Exactly one thread drains it in FIFO order and appends
// each record to the structured log and the transcript. Nothing else writes
// those files while the thread is alive, so no file locking is needed and
// persisted order always equals enqueue order.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::AuditError;
use crate::log::StructuredLog;
use crate::record::LogRecord;
use crate::settings::Verbosity;
use crate::transcript;

enum WriterMessage {
    Record(Box<LogRecord>),
    /// Acknowledged once every message queued before it is on disk.
    Barrier(mpsc::Sender<()>),
    Shutdown,
}

/// Counters reported when the persistence thread stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub persisted: u64,
    pub failed: u64,
}

/// Handle to a running persistence thread.
pub(crate) struct PersistenceLoop {
    sender: SyncSender<WriterMessage>,
    handle: Option<JoinHandle<WriterStats>>,
    session_id: String,
}

impl PersistenceLoop {
    /// Open both session files and start the thread.
    ///
    /// Files are opened here, not on the thread, so an unwritable session
    /// fails initialization instead of failing silently later.
    pub(crate) fn spawn(
        session_id: &str,
        jsonl: &Path,
        transcript: &Path,
        verbosity: Verbosity,
        capacity: usize,
        poll_interval: Duration,
    ) -> Result<Self, AuditError> {
        let log = StructuredLog::open(jsonl).map_err(into_fatal)?;
        let transcript_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(transcript)
            .map_err(|source| AuditError::EngagementUnavailable {
                path: transcript.to_path_buf(),
                source,
            })?;

        let mut sink = SessionSink {
            log,
            transcript: transcript_file,
            transcript_path: transcript.to_path_buf(),
            verbosity,
            stats: WriterStats::default(),
        };

        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let thread_session = session_id.to_string();
        let handle = thread::Builder::new()
            .name(format!("audit-writer-{}", session_id))
            .spawn(move || {
                loop {
                    match receiver.recv_timeout(poll_interval) {
                        Ok(WriterMessage::Record(record)) => sink.persist(&record),
                        Ok(WriterMessage::Barrier(ack)) => {
                            let _ = ack.send(());
                        }
                        Ok(WriterMessage::Shutdown) => break,
                        // Idle: wake up so a shutdown is never stuck behind a
                        // blocking receive.
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!(
                    session_id = %thread_session,
                    persisted = sink.stats.persisted,
                    failed = sink.stats.failed,
                    "audit writer stopped"
                );
                sink.stats
            })
            .map_err(|_| AuditError::PipelineClosed {
                session_id: session_id.to_string(),
            })?;

        Ok(Self {
            sender,
            handle: Some(handle),
            session_id: session_id.to_string(),
        })
    }

    /// Queue a record. Blocks only when the bounded queue is full.
    pub(crate) fn enqueue(&self, record: LogRecord) -> Result<(), AuditError> {
        self.sender
            .send(WriterMessage::Record(Box::new(record)))
            .map_err(|_| self.closed())
    }

    /// Block until everything queued so far has been persisted.
    pub(crate) fn flush(&self) -> Result<(), AuditError> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.sender
            .send(WriterMessage::Barrier(ack_tx))
            .map_err(|_| self.closed())?;
        ack_rx.recv().map_err(|_| self.closed())
    }

    /// Drain the queue, stop the thread, and return its counters.
    pub(crate) fn shutdown(mut self) -> Result<WriterStats, AuditError> {
        // The sentinel sits behind every queued record, so FIFO order drains
        // them first. A send error means the thread already exited.
        let _ = self.sender.send(WriterMessage::Shutdown);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| self.closed()),
            None => Ok(WriterStats::default()),
        }
    }

    fn closed(&self) -> AuditError {
        AuditError::PipelineClosed {
            session_id: self.session_id.clone(),
        }
    }
}

fn into_fatal(err: AuditError) -> AuditError {
    match err {
        AuditError::OpenFailed { path, source } => {
            AuditError::EngagementUnavailable { path, source }
        }
        other => other,
    }
}

/// File handles owned by the persistence thread.
struct SessionSink {
    log: StructuredLog,
    transcript: File,
    transcript_path: PathBuf,
    verbosity: Verbosity,
    stats: WriterStats,
}

impl SessionSink {
    fn persist(&mut self, record: &LogRecord) {
        let result = self
            .log
            .append(record)
            .and_then(|()| self.append_transcript(record));
        match result {
            Ok(()) => self.stats.persisted += 1,
            Err(e) => {
                self.stats.failed += 1;
                tracing::error!(
                    path = %self.log.path().display(),
                    error = %e,
                    "failed to persist audit record"
                );
            }
        }
    }

    fn append_transcript(&mut self, record: &LogRecord) -> Result<(), AuditError> {
        let block = match record {
            LogRecord::Scope(event) => transcript::scope_entry(event),
            LogRecord::Command(entry) => {
                let output = match (&entry.output_file, self.verbosity) {
                    (Some(path), Verbosity::Full) => std::fs::read(path)
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                        .map_err(|e| {
                            tracing::warn!(
                                path = %path.display(),
                                error = %e,
                                "output artifact unreadable for transcript"
                            );
                        })
                        .ok(),
                    _ => None,
                };
                transcript::command_entry(entry, self.verbosity, output.as_deref())
            }
        };
        self.transcript
            .write_all(block.as_bytes())
            .and_then(|()| self.transcript.flush())
            .map_err(|e| AuditError::write(&self.transcript_path, e))
    }
}
