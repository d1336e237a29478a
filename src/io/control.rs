//! Calibration and cancellation collaborators of the frame loop.
//!
//! The loop only ever reads a [`Calibration`] snapshot through
//! [`ParameterSource`] and waits for keys through [`KeyPoll`]. Whoever adjusts
//! the sliders writes through [`SharedCalibration`], whose lock guarantees a
//! snapshot never observes a half-applied update.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Calibration, Control};

/// Key code that stops the frame loop
pub const ESC_KEY: u8 = 27;

/// Supplies the segmentation bounds for one frame
pub trait ParameterSource {
    fn snapshot(&self) -> Calibration;
}

/// Fixed bounds
impl ParameterSource for Calibration {
    fn snapshot(&self) -> Calibration {
        *self
    }
}

/// Bounds shared with a calibration controller running elsewhere
#[derive(Debug, Clone, Default)]
pub struct SharedCalibration {
    inner: Arc<RwLock<Calibration>>,
}

impl SharedCalibration {
    pub fn new(initial: Calibration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Move one slider; returns the clamped value stored
    pub fn set(&self, control: Control, value: i64) -> u8 {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.set(control, value)
    }

    pub fn replace(&self, calibration: Calibration) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = calibration;
    }
}

impl ParameterSource for SharedCalibration {
    fn snapshot(&self) -> Calibration {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Display-wait that doubles as the cancellation poll
pub trait KeyPoll {
    /// Wait up to `delay` and return the key pressed meanwhile, if any
    fn wait_key(&mut self, delay: Duration) -> Option<u8>;
}

/// Sleeps for the frame delay and never reports a key
#[derive(Debug, Default)]
pub struct SleepKeys;

impl KeyPoll for SleepKeys {
    fn wait_key(&mut self, delay: Duration) -> Option<u8> {
        thread::sleep(delay);
        None
    }
}

/// One line typed on the control console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Set(Control, i64),
    Reset,
    Show,
    Quit,
}

/// Parse a console line: `hmin 30`, `reset`, `show`, `quit`, or an ESC byte
pub fn parse_command(line: &str) -> Option<ControlCommand> {
    if line.contains(ESC_KEY as char) {
        return Some(ControlCommand::Quit);
    }
    let mut words = line.split_whitespace();
    let head = words.next()?;
    match head.to_ascii_lowercase().as_str() {
        "quit" | "q" | "esc" => Some(ControlCommand::Quit),
        "reset" => Some(ControlCommand::Reset),
        "show" => Some(ControlCommand::Show),
        _ => {
            let control: Control = head.parse().ok()?;
            let value: i64 = words.next()?.parse().ok()?;
            Some(ControlCommand::Set(control, value))
        }
    }
}

/// Apply a command to the shared bounds. Returns the key to forward to the
/// loop, if the command produced one.
pub fn apply_command(
    command: &ControlCommand,
    calibration: &SharedCalibration,
    defaults: Calibration,
) -> Option<u8> {
    match command {
        ControlCommand::Set(control, value) => {
            let stored = calibration.set(*control, *value);
            info!("{} = {}", control.name(), stored);
            None
        }
        ControlCommand::Reset => {
            calibration.replace(defaults);
            info!("Calibration reset: {}", defaults);
            None
        }
        ControlCommand::Show => {
            info!("Calibration: {}", calibration.snapshot());
            None
        }
        ControlCommand::Quit => Some(ESC_KEY),
    }
}

/// Console stand-in for the slider window: a background thread reads stdin
/// lines, applies calibration commands, and forwards ESC to the loop.
pub struct StdinControl {
    keys: Receiver<u8>,
}

impl StdinControl {
    pub fn spawn(calibration: SharedCalibration) -> Self {
        let (sender, keys) = mpsc::channel();
        let defaults = calibration.snapshot();
        thread::spawn(move || read_commands(std::io::stdin().lock(), &calibration, defaults, sender));
        Self { keys }
    }
}

/// Command loop run by the control thread; returns when the input ends or the
/// loop stops listening.
pub fn read_commands(
    input: impl BufRead,
    calibration: &SharedCalibration,
    defaults: Calibration,
    sender: Sender<u8>,
) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Control input closed: {}", e);
                return;
            }
        };
        match parse_command(&line) {
            Some(command) => {
                if let Some(key) = apply_command(&command, calibration, defaults) {
                    if sender.send(key).is_err() {
                        return;
                    }
                }
            }
            None if line.trim().is_empty() => {}
            None => warn!("Unrecognized control command: {:?}", line),
        }
    }
    debug!("Control input reached end of file");
}

impl KeyPoll for StdinControl {
    fn wait_key(&mut self, delay: Duration) -> Option<u8> {
        match self.keys.recv_timeout(delay) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(delay);
                None
            }
        }
    }
}
