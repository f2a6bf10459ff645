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

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::{Event, TimelineCommand};
use crate::keys::DrumKey;

const START: &str = "start";
const STOP: &str = "stop";
const PAUSE: &str = "pause";
const RESUME: &str = "resume";
const LOOP_ON: &str = "loop on";
const LOOP_OFF: &str = "loop off";
const QUIT: &str = "quit";

/// A driver that plays the kit from lines typed on the terminal.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Turns a line of input into events. Lines starting with ':' are commands,
    /// a pad name clicks that pad, and anything else is typed key by key.
    fn parse_line(line: &str) -> Vec<Event> {
        let line = line.trim();
        if let Some(command) = line.strip_prefix(':') {
            let command = command.trim().to_lowercase();
            let event = match command.as_str() {
                START => Event::Timeline(TimelineCommand::Start),
                STOP => Event::Timeline(TimelineCommand::Stop),
                PAUSE => Event::Timeline(TimelineCommand::Pause),
                RESUME => Event::Timeline(TimelineCommand::Resume),
                LOOP_ON => Event::Timeline(TimelineCommand::Loop(true)),
                LOOP_OFF => Event::Timeline(TimelineCommand::Loop(false)),
                QUIT => Event::Quit,
                _ => {
                    warn!(command, "Unrecognized command");
                    return Vec::new();
                }
            };
            return vec![event];
        }

        if let Ok(key) = line.parse::<DrumKey>() {
            return vec![Event::Click(key)];
        }

        line.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Event::KeyDown(c.to_ascii_uppercase() as u32))
            .collect()
    }

    /// Handles one line of input. Returns false once input is finished.
    fn monitor_io<R, W>(
        events_tx: &UnboundedSender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Keys, a pad name, or :{}|:{}|:{}|:{}|:{}|:{}|:{}> ",
            START, STOP, PAUSE, RESUME, LOOP_ON, LOOP_OFF, QUIT,
        )?;
        writer.flush()?;

        let mut input = String::default();
        if reader.read_line(&mut input)? == 0 {
            info!("End of input.");
            events_tx.send(Event::Quit).map_err(io::Error::other)?;
            return Ok(false);
        }

        let mut more = true;
        for event in Self::parse_line(&input) {
            more &= event != Event::Quit;
            events_tx.send(event).map_err(io::Error::other)?;
        }
        Ok(more)
    }
}

impl super::Driver for Driver {
    fn monitor_events(
        &self,
        events_tx: UnboundedSender<Event>,
    ) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            Ok(())
        })
    }
}
