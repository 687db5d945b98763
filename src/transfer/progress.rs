use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{types::Progress, warning};

/// Stage value of the terminal record of a successful run.
pub const COMPLETE_STAGE: &str = "COMPLETE";

#[derive(Serialize)]
struct Complete<'a, P: Serialize> {
    stage: &'static str,
    #[serde(flatten)]
    payload: &'a P,
}

/// Encodes one record as a server-sent-event frame: `data: <json>\n\n`.
pub fn encode_frame<T: Serialize>(record: &T) -> Result<String, serde_json::Error> {
    Ok(format!("data: {}\n\n", serde_json::to_string(record)?))
}

/// One-way progress channel from a pipeline run to the browser.
///
/// The consumer never answers. If it goes away mid-run the reporter turns
/// silent and the run carries on.
pub struct ProgressReporter {
    tx: Option<UnboundedSender<String>>,
    closed: AtomicBool,
}

impl ProgressReporter {
    /// A reporter plus the receiving end of its frames.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (
            Self {
                tx: Some(tx),
                closed: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// A reporter that drops everything, for runs without a stream.
    pub fn silent() -> Self {
        Self {
            tx: None,
            closed: AtomicBool::new(true),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Sends `{stage, count, total}`. `total` is left out of the frame when
    /// unknown.
    pub fn emit(&self, stage: impl Into<String>, count: usize, total: Option<usize>) {
        self.send(&Progress {
            stage: stage.into(),
            count,
            total,
        });
    }

    /// Terminal failure record: stage `Error: <message>`, count 0.
    pub fn fail(&self, message: impl std::fmt::Display) {
        self.emit(format!("Error: {}", message), 0, None);
    }

    /// Terminal success record carrying the run's result.
    pub fn complete<P: Serialize>(&self, payload: &P) {
        self.send(&Complete {
            stage: COMPLETE_STAGE,
            payload,
        });
    }

    fn send<T: Serialize>(&self, record: &T) {
        let Some(tx) = &self.tx else {
            return;
        };
        if self.is_closed() {
            return;
        }

        let frame = match encode_frame(record) {
            Ok(frame) => frame,
            Err(e) => {
                warning!("Cannot encode progress record: {}", e);
                return;
            }
        };

        if tx.send(frame).is_err() && !self.closed.swap(true, Ordering::Relaxed) {
            warning!("Progress stream closed by client, continuing without it");
        }
    }
}
