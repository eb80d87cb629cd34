use std::cell::RefCell;
use std::fmt;

/// User-visible notices emitted by the capture pipelines.
/// User-visible pipeline notices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    SettingUp,
    Ready,
    Capturing,
    CaptureFailed,
    Recording,
    Processing,
    RecordingFailed,
    /// Detail for the failure notice that accompanies `CaptureFailed`/`RecordingFailed`.
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SettingUp => f.write_str("Setting up camera..."),
            Self::Ready => f.write_str("Ready"),
            Self::Capturing => f.write_str("Capturing..."),
            Self::CaptureFailed => f.write_str("Capture Failed"),
            Self::Recording => f.write_str("Recording..."),
            Self::Processing => f.write_str("Processing video..."),
            Self::RecordingFailed => f.write_str("Recording Failed"),
            Self::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Receives [`Status`] notices as the pipelines progress.
pub trait StatusSink {
    fn notify(&self, status: Status);
}

/// Writes notices to the log.
/// Writes every notice to the `tracing` log at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn notify(&self, status: Status) {
        match status {
            Status::CaptureFailed | Status::RecordingFailed | Status::Error(_) => {
                tracing::warn!(%status, "status");
            }
            _ => tracing::info!(%status, "status"),
        }
    }
}

/// Collects notices in order.
impl StatusSink for RefCell<Vec<Status>> {
    fn notify(&self, status: Status) {
        self.borrow_mut().push(status);
    }
}

/// Publishes the latest notice to watchers (e.g. a UI task).
impl StatusSink for tokio::sync::watch::Sender<Status> {
    fn notify(&self, status: Status) {
        self.send_replace(status);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &S {
    fn notify(&self, status: Status) {
        (**self).notify(status);
    }
}
