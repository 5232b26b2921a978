//! Fire-and-forget status display
//!
//! The control loop publishes [`StatusEvent`]s with `try_send` on a bounded
//! channel. A detached `status-display` thread drains them and keeps a one-line
//! summary of the mission. Nothing ever flows back: a full queue drops the
//! event, a gone display is ignored, and the control loop never waits on it.

use crate::error::Result;
use crate::position::GridPoint;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use yantra_io::Color;

#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    Phase {
        phase: &'static str,
        position: GridPoint,
    },
    Registry(String),
    Grabbed {
        color: Color,
        row: i32,
    },
    Delivered {
        color: Color,
        total: usize,
    },
    Message(String),
}

/// Publishing side, cheap to clone
#[derive(Clone, Default)]
pub struct StatusSender {
    tx: Option<Sender<StatusEvent>>,
    dropped: Arc<AtomicU64>,
}

impl StatusSender {
    /// Sender that discards everything
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Never blocks, never fails
    pub fn publish(&self, event: StatusEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Display state rebuilt from the event stream
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusLine {
    pub phase: Option<&'static str>,
    pub position: Option<GridPoint>,
    pub carrying: Option<Color>,
    pub delivered: usize,
}

impl StatusLine {
    pub fn apply(&mut self, event: &StatusEvent) {
        match event {
            StatusEvent::Phase { phase, position } => {
                self.phase = Some(phase);
                self.position = Some(*position);
            }
            StatusEvent::Grabbed { color, .. } => self.carrying = Some(*color),
            StatusEvent::Delivered { total, .. } => {
                self.carrying = None;
                self.delivered = *total;
            }
            StatusEvent::Registry(_) | StatusEvent::Message(_) => {}
        }
    }

    pub fn render(&self) -> String {
        let position = self
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let carrying = self
            .carrying
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "[{}] at {} carrying {} delivered {}",
            self.phase.unwrap_or("idle"),
            position,
            carrying,
            self.delivered
        )
    }
}

fn drain(rx: Receiver<StatusEvent>) {
    let mut line = StatusLine::default();
    while let Ok(event) = rx.recv() {
        line.apply(&event);
        match &event {
            StatusEvent::Registry(layout) => {
                tracing::info!(target: "marga_nav::status", "Bins: {}", layout)
            }
            StatusEvent::Message(text) => tracing::info!(target: "marga_nav::status", "{}", text),
            StatusEvent::Phase { .. } => {
                tracing::debug!(target: "marga_nav::status", "{}", line.render())
            }
            _ => tracing::info!(target: "marga_nav::status", "{}", line.render()),
        }
    }
}

/// Start the detached display thread
///
/// The thread exits once every [`StatusSender`] clone is dropped.
pub fn spawn_display(queue: usize) -> Result<StatusSender> {
    let (tx, rx) = bounded(queue.max(1));
    thread::Builder::new()
        .name("status-display".into())
        .spawn(move || drain(rx))?;
    Ok(StatusSender {
        tx: Some(tx),
        dropped: Arc::new(AtomicU64::new(0)),
    })
}
