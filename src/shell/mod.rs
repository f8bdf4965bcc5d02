//! Interactive Shell
//!
//! Menu-driven front end over a shared session. The binary owns the
//! terminal; this module turns input lines into session calls, log entries
//! and output text, so it runs the same against a test harness.

mod activity_log;
mod command;

pub use activity_log::ActivityLog;
pub use command::{parse_line, ShellCommand};

use bytes::Bytes;
use chrono::{DateTime, Local};
use crossbeam::channel::Receiver;

use crate::error::Result;
use crate::network::{JobEvent, JobKind, SharedSession};

/// What the caller should do after a line was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print the text (may be empty) and prompt again
    Continue(String),

    /// Clear the terminal and prompt again
    ClearScreen,

    /// Leave the loop
    Quit,
}

/// Shell state
pub struct Shell {
    session: SharedSession,
    log: ActivityLog,

    /// Scheduler outcomes, drained before each line
    events: Option<Receiver<JobEvent>>,

    last_keep_alive: Option<DateTime<Local>>,
}

fn display(value: &Bytes) -> String {
    String::from_utf8_lossy(value).into_owned()
}

impl Shell {
    pub fn new(session: SharedSession, log: ActivityLog, events: Option<Receiver<JobEvent>>) -> Self {
        Self {
            session,
            log,
            events,
            last_keep_alive: None,
        }
    }

    /// Read the identity variable and record the connection
    pub fn announce(&mut self, identity_var: &str) -> Result<String> {
        let identity = match self.session.read(identity_var) {
            Ok(value) => display(&value),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", identity_var, e);
                "unknown controller".to_string()
            }
        };
        self.log.connected(self.session.addr(), &identity)?;
        Ok(format!("Connected to {} at {}", identity, self.session.addr()))
    }

    /// Handle one input line
    pub fn step(&mut self, line: &str) -> Result<Step> {
        self.drain_events()?;

        let output = match parse_line(line) {
            ShellCommand::Empty => String::new(),
            ShellCommand::Quit => {
                self.log.disconnected(self.session.addr())?;
                return Ok(Step::Quit);
            }
            ShellCommand::Clear => return Ok(Step::ClearScreen),
            ShellCommand::Help => help(&self.log),
            ShellCommand::Ping => match self.session.keep_alive() {
                Ok(()) => {
                    self.log.manual_keep_alive()?;
                    "Keep-alive sent".to_string()
                }
                Err(e) => {
                    self.log.failure(Local::now(), "Manual keep-alive", &e.to_string())?;
                    format!("Keep-alive failed: {}", e)
                }
            },
            ShellCommand::LastPing => match self.last_keep_alive {
                Some(at) => format!("Last automatic keep-alive: {}", at.format("%Y-%m-%d %H:%M:%S")),
                None => "No automatic keep-alive yet".to_string(),
            },
            ShellCommand::Read { name } => match self.session.read(&name) {
                Ok(value) => {
                    let value = display(&value);
                    self.log.value_read(Local::now(), &name, &value)?;
                    format!("{} = {}", name, value)
                }
                Err(e) => {
                    self.log.failure(Local::now(), &format!("Read of {}", name), &e.to_string())?;
                    format!("Read of {} failed: {}", name, e)
                }
            },
            ShellCommand::Write { name, value } => match self.session.write(&name, &value) {
                Ok(echoed) => {
                    let echoed = display(&echoed);
                    self.log.value_written(&name, &value, &echoed)?;
                    format!("{} set to {}", name, echoed)
                }
                Err(e) => {
                    self.log.failure(Local::now(), &format!("Write of {}", name), &e.to_string())?;
                    format!("Write of {} failed: {}", name, e)
                }
            },
        };

        Ok(Step::Continue(output))
    }

    /// Record scheduler outcomes
    fn drain_events(&mut self) -> Result<()> {
        let Some(events) = &self.events else {
            return Ok(());
        };

        for event in events.try_iter() {
            match (&event.kind, &event.outcome) {
                (JobKind::KeepAlive { .. }, Ok(_)) => {
                    self.last_keep_alive = Some(event.at);
                    self.log.automatic_keep_alive(event.at)?;
                }
                (JobKind::Poll { var }, Ok(value)) => {
                    let value = value.as_ref().map(display).unwrap_or_default();
                    self.log.value_read(event.at, var, &value)?;
                }
                (kind, Err(message)) => {
                    let what = match kind {
                        JobKind::KeepAlive { .. } => "Automatic keep-alive".to_string(),
                        JobKind::Poll { var } => format!("Poll of {}", var),
                    };
                    self.log.failure(event.at, &what, message)?;
                }
            }
        }
        Ok(())
    }

    /// Time of the last successful automatic keep-alive seen so far
    pub fn last_keep_alive(&self) -> Option<DateTime<Local>> {
        self.last_keep_alive
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }
}

/// Menu shown before each prompt
pub fn menu(addr: &str) -> String {
    let rule = "=".repeat(70);
    format!(
        "\n{rule}\n\
         Connected to controller {addr}\n\
         {rule}\n\
         NAME             read a variable\n\
         NAME, VALUE      write a variable\n\
         h                help\n\
         p                keep-alive now\n\
         pm               last automatic keep-alive\n\
         c                clear screen\n\
         q                quit\n\
         {rule}\n\
         > "
    )
}

/// Help text
pub fn help(log: &ActivityLog) -> String {
    format!(
        "Read a variable by typing its name, e.g. \"$OV_PRO\" or \"SCHICHT\".\n\
         Set a variable with \"NAME, VALUE\", e.g. \"SCHICHT, 80\".\n\
         Values are logged to {} and connection events to {}.",
        log.values_path().display(),
        log.connection_path().display()
    )
}
