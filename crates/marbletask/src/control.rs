//! Operator commands read from stdin on a background thread.
//!
//! One command per line:
//!
//! | line          | signal                          |
//! |---------------|---------------------------------|
//! | `q`, `quit`   | stop the task                   |
//! | `r`, `reset`  | move the course back to the top |
//! | `press a`     | hold the left key (`d` = right) |
//! | `release a`   | let go of the left key          |
//!
//! End of input also stops the task.

use std::io::{self, BufRead, BufReader};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use kinematics::{KeyEvent, TaskKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Stop,
    ResetCourse,
    Key(KeyEvent),
}

pub fn parse_command(line: &str) -> Option<ControlSignal> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();
    let signal = match head.as_str() {
        "q" | "quit" | "exit" => ControlSignal::Stop,
        "r" | "reset" => ControlSignal::ResetCourse,
        "press" | "release" => {
            let key = TaskKey::from_name(&words.next()?.to_ascii_lowercase())?;
            let event = if head == "press" {
                KeyEvent::press(key)
            } else {
                KeyEvent::release(key)
            };
            ControlSignal::Key(event)
        }
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(signal)
}

/// Forwards parsed commands until end of input, then sends a final stop.
pub fn pump_commands<R: BufRead>(reader: R, signals: &Sender<ControlSignal>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "stopped reading operator input");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(signal) => {
                if signals.send(signal).is_err() {
                    return;
                }
                if signal == ControlSignal::Stop {
                    return;
                }
            }
            None => tracing::warn!(command = line.trim(), "ignoring unknown operator command"),
        }
    }
    let _ = signals.send(ControlSignal::Stop);
}

pub struct ControlThread {
    signals: Receiver<ControlSignal>,
    _handle: JoinHandle<()>,
}

impl ControlThread {
    /// Reads operator commands from `reader` on a named background thread.
    ///
    /// The thread is detached: a blocked read on stdin must not keep the
    /// process alive once the frame loop returns.
    pub fn spawn<R>(reader: R) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("marbletask-control".into())
            .spawn(move || pump_commands(reader, &tx))
            .map_err(|err| anyhow!("failed to spawn control thread: {err}"))?;
        Ok(Self {
            signals: rx,
            _handle: handle,
        })
    }

    pub fn stdin() -> Result<Self> {
        Self::spawn(BufReader::new(io::stdin()))
    }

    pub fn receiver(&self) -> &Receiver<ControlSignal> {
        &self.signals
    }
}
