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
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, span, Instrument, Level};

use super::Event;
use crate::timeline::{TickSource, Timer};

/// Posts a tick to the event loop on every period of a tokio interval.
pub struct IntervalTicks {
    events_tx: UnboundedSender<Event>,
}

impl IntervalTicks {
    pub fn new(events_tx: UnboundedSender<Event>) -> IntervalTicks {
        IntervalTicks { events_tx }
    }
}

impl TickSource for IntervalTicks {
    fn start(&self, period: Duration) -> Box<dyn Timer> {
        let events_tx = self.events_tx.clone();
        let handle = tokio::spawn(
            async move {
                // The first tick lands one period after start.
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                debug!(period = ?period, "Ticker started.");

                loop {
                    interval.tick().await;
                    if events_tx.send(Event::Tick).is_err() {
                        debug!("Event loop is gone, ticker exiting.");
                        return;
                    }
                }
            }
            .instrument(span!(Level::DEBUG, "ticker")),
        );
        Box::new(IntervalTimer { handle })
    }
}

/// A running interval task.
struct IntervalTimer {
    handle: JoinHandle<()>,
}

impl Timer for IntervalTimer {
    fn cancel(&mut self) {
        self.handle.abort();
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
