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
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, span, Instrument, Level};

use crate::keys::DrumKey;
use crate::timeline::{TickSource, Timeline};
use crate::trigger::{SampleTrigger, Stage, Trigger};

pub mod keyboard;
pub mod ticker;

/// Commands for the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimelineCommand {
    Start,
    Stop,
    Pause,
    Resume,
    /// Turns looping on or off.
    Loop(bool),
}

/// Everything that happens to the kit arrives as one of these, on one channel.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A key was pressed. Carries the upper case key code.
    KeyDown(u32),

    /// A pad was clicked.
    Click(DrumKey),

    /// The audio for a key played to its end.
    AudioEnded(DrumKey),

    /// A pad finished a transition on the given property.
    TransitionEnd { key: DrumKey, property: String },

    /// The timeline timer fired.
    Tick,

    Timeline(TimelineCommand),

    /// Shuts the controller down.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(
        &self,
        events_tx: UnboundedSender<Event>,
    ) -> JoinHandle<Result<(), io::Error>>;
}

/// The state the event loop owns. Nothing else touches it, so none of it is
/// locked.
struct EventLoop {
    stage: Arc<dyn Stage>,
    trigger: SampleTrigger,
    timeline: Timeline,
    ticks: Box<dyn TickSource + Send>,
}

impl EventLoop {
    fn new(
        stage: Arc<dyn Stage>,
        timeline: Timeline,
        ticks: Box<dyn TickSource + Send>,
    ) -> EventLoop {
        EventLoop {
            trigger: SampleTrigger::new(stage.clone()),
            stage,
            timeline,
            ticks,
        }
    }

    /// Handles one event. Returns false once the loop should end.
    fn handle(&mut self, event: Event) -> bool {
        if event != Event::Tick {
            debug!(event = ?event, "Received event.");
        }

        match event {
            Event::KeyDown(code) => match DrumKey::from_code(code) {
                Some(key) => self.play(key),
                None => debug!(code, "No drum for key."),
            },
            Event::Click(key) => self.play(key),
            Event::AudioEnded(key) => {
                if let Some(audio) = self.stage.audio(key) {
                    audio.ended();
                }
            }
            Event::TransitionEnd { key, property } => {
                if let Some(pad) = self.stage.pad(key) {
                    pad.transition_end(&property);
                }
            }
            Event::Tick => {
                if let Err(e) = self.timeline.tick(&mut self.trigger) {
                    error!(err = e.to_string(), "Error playing timeline");
                }
            }
            Event::Timeline(command) => self.command(command),
            Event::Quit => {
                self.timeline.stop();
                return false;
            }
        }
        true
    }

    fn play(&mut self, key: DrumKey) {
        if let Err(e) = self.trigger.trigger(key) {
            error!(err = e.to_string(), "Error playing key");
        }
    }

    fn command(&mut self, command: TimelineCommand) {
        match command {
            TimelineCommand::Start => self.timeline.start(self.ticks.as_ref()),
            TimelineCommand::Stop => self.timeline.stop(),
            TimelineCommand::Pause => self.timeline.pause(),
            TimelineCommand::Resume => self.timeline.resume(),
            TimelineCommand::Loop(looping) => self.timeline.set_loop(looping),
        }
        info!(
            time = self.timeline.time(),
            running = self.timeline.is_running(),
            paused = self.timeline.is_paused(),
            looping = self.timeline.is_looping(),
            "Timeline updated."
        );
    }
}

/// Runs the kit: plays keys from the driver and drives the timeline.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller. The events channel is passed in because the
    /// stage posts audio and transition ends on it too.
    pub fn new(
        stage: Arc<dyn Stage>,
        timeline: Timeline,
        driver: Arc<dyn Driver>,
        events_tx: UnboundedSender<Event>,
        events_rx: UnboundedReceiver<Event>,
    ) -> Controller {
        let ticks = Box::new(ticker::IntervalTicks::new(events_tx.clone()));
        let event_loop = EventLoop::new(stage, timeline, ticks);
        Controller {
            handle: tokio::spawn(
                Controller::run(event_loop, driver, events_tx, events_rx)
                    .instrument(span!(Level::INFO, "controller")),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    async fn run(
        mut event_loop: EventLoop,
        driver: Arc<dyn Driver>,
        events_tx: UnboundedSender<Event>,
        mut events_rx: UnboundedReceiver<Event>,
    ) {
        let join_handle = driver.monitor_events(events_tx);
        info!(
            tracks = event_loop.timeline.tracks().count(),
            duration = event_loop.timeline.duration(),
            "Controller started."
        );

        while let Some(event) = events_rx.recv().await {
            if !event_loop.handle(event) {
                break;
            }
        }

        event_loop.timeline.stop();
        info!("Controller closing.");
        match join_handle.await {
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }
}
