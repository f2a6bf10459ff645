// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::controller::Event;
use crate::keys::DrumKey;
use crate::trigger::{PadElement, TransitionListener, TRANSFORM};

/// The row of pads printed to the terminal.
pub struct PadRow {
    keys: Vec<DrumKey>,
    active: Mutex<HashSet<DrumKey>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl PadRow {
    /// Creates a row that shows the given keys in order.
    pub fn new(keys: Vec<DrumKey>, output: Box<dyn Write + Send>) -> PadRow {
        PadRow {
            keys,
            active: Mutex::new(HashSet::new()),
            output: Mutex::new(output),
        }
    }

    /// The current row as text. Active pads are bracketed and upper case.
    pub fn row(&self) -> String {
        let active = self.active.lock();
        Self::format(&self.keys, &active)
    }

    fn format(keys: &[DrumKey], active: &HashSet<DrumKey>) -> String {
        keys.iter()
            .map(|key| {
                if active.contains(key) {
                    format!("[{} {}]", key.letter(), key.name().to_uppercase())
                } else {
                    format!(" {} {} ", key.letter().to_ascii_lowercase(), key.name())
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// Updates a pad and prints the row.
    fn set_active(&self, key: DrumKey, is_active: bool) {
        let line = {
            let mut active = self.active.lock();
            if is_active {
                active.insert(key);
            } else {
                active.remove(&key);
            }
            Self::format(&self.keys, &active)
        };

        let mut output = self.output.lock();
        if let Err(e) = writeln!(output, "{}", line).and_then(|_| output.flush()) {
            warn!(err = e.to_string(), "Unable to draw pads");
        }
    }
}

/// A pad on the console. Changing its active state runs a transform
/// transition that ends after the configured time. A new change cancels the
/// transition still in flight.
pub struct ConsolePad {
    key: DrumKey,
    transition: Duration,
    events_tx: UnboundedSender<Event>,
    row: Arc<PadRow>,
    active: AtomicBool,
    pending: Mutex<Option<JoinHandle<()>>>,
    listeners: Mutex<Vec<TransitionListener>>,
}

impl ConsolePad {
    pub fn new(
        key: DrumKey,
        transition: Duration,
        events_tx: UnboundedSender<Event>,
        row: Arc<PadRow>,
    ) -> ConsolePad {
        ConsolePad {
            key,
            transition,
            events_tx,
            row,
            active: AtomicBool::new(false),
            pending: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn set_active(&self, active: bool) {
        if self.active.swap(active, Ordering::AcqRel) == active {
            return;
        }
        self.row.set_active(self.key, active);
        self.start_transition();
    }

    /// Posts the end of the transform transition back to the event loop once
    /// the transition time has passed.
    fn start_transition(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(key = self.key.name(), "No runtime for pad transition");
            return;
        };

        let key = self.key;
        let transition = self.transition;
        let events_tx = self.events_tx.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(transition).await;
            // The loop may already be gone at shutdown.
            let _ = events_tx.send(Event::TransitionEnd {
                key,
                property: TRANSFORM.to_string(),
            });
        });
        if let Some(superseded) = self.pending.lock().replace(task) {
            superseded.abort();
        }
    }
}

impl PadElement for ConsolePad {
    fn add_active(&self) {
        self.set_active(true);
    }

    fn remove_active(&self) {
        self.set_active(false);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn on_transition_end(&self, listener: TransitionListener) {
        self.listeners.lock().push(listener);
    }

    fn transition_end(&self, property: &str) {
        for listener in self.listeners.lock().iter() {
            listener(property);
        }
    }
}
