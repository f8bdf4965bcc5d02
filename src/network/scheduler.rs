//! Periodic Scheduler
//!
//! Background jobs against a shared session: keep-alive reads that stop the
//! controller (or anything in between) from reaping an idle connection, and
//! polls of watched variables.
//!
//! One worker thread per job, each driven by a ticker and stopped by closing
//! a shutdown channel. Outcomes are reported on an event channel.

use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Local};
use crossbeam::channel::{self, Receiver, Sender};

use super::SharedSession;
use crate::config::Config;
use crate::error::{OsvError, Result};

/// What a job does on each tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Read `var` and discard the value
    KeepAlive { var: String },

    /// Read `var` and report the value
    Poll { var: String },
}

impl JobKind {
    pub fn var(&self) -> &str {
        match self {
            JobKind::KeepAlive { var } | JobKind::Poll { var } => var,
        }
    }
}

/// A job and its period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub kind: JobKind,
    pub interval: Duration,
}

impl Job {
    pub fn keep_alive(var: impl Into<String>, interval: Duration) -> Self {
        Self {
            kind: JobKind::KeepAlive { var: var.into() },
            interval,
        }
    }

    pub fn poll(var: impl Into<String>, interval: Duration) -> Self {
        Self {
            kind: JobKind::Poll { var: var.into() },
            interval,
        }
    }
}

/// Outcome of one job run
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub kind: JobKind,

    /// When the run finished
    pub at: DateTime<Local>,

    /// `Ok(Some(value))` for polls, `Ok(None)` for keep-alives, or the
    /// failure message
    pub outcome: std::result::Result<Option<Bytes>, String>,
}

/// Handle to the running worker threads
pub struct Scheduler {
    /// Dropping the sender wakes every worker
    stop_tx: Option<Sender<()>>,

    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start one worker per job
    pub fn start(session: SharedSession, jobs: Vec<Job>) -> Result<(Self, Receiver<JobEvent>)> {
        if let Some(job) = jobs.iter().find(|job| job.interval.is_zero()) {
            return Err(OsvError::Config(format!(
                "job for {} has a zero interval",
                job.kind.var()
            )));
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let (event_tx, event_rx) = channel::unbounded();

        let mut scheduler = Self {
            stop_tx: Some(stop_tx),
            workers: Vec::with_capacity(jobs.len()),
        };

        for job in jobs {
            let session = session.clone();
            let stop_rx = stop_rx.clone();
            let event_tx = event_tx.clone();
            // On spawn failure the already started workers are stopped by Drop
            let handle = std::thread::Builder::new()
                .name(format!("osv-job-{}", job.kind.var()))
                .spawn(move || run_job(job, session, stop_rx, event_tx))?;
            scheduler.workers.push(handle);
        }

        Ok((scheduler, event_rx))
    }

    /// Start the keep-alive job plus one poll job per watched variable
    pub fn from_config(session: SharedSession, config: &Config) -> Result<(Self, Receiver<JobEvent>)> {
        let mut jobs = vec![Job::keep_alive(
            config.heartbeat_var.clone(),
            config.keep_alive_interval(),
        )];
        jobs.extend(
            config
                .watch
                .iter()
                .map(|w| Job::poll(w.name.clone(), Duration::from_secs(w.interval_secs))),
        );
        Self::start(session, jobs)
    }

    /// Number of running workers
    pub fn job_count(&self) -> usize {
        self.workers.len()
    }

    /// Signal every worker and wait for it to finish its current run
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("Scheduler worker panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_job(job: Job, session: SharedSession, stop_rx: Receiver<()>, events: Sender<JobEvent>) {
    tracing::debug!("Starting {:?} every {:?}", job.kind, job.interval);
    let ticker = channel::tick(job.interval);

    loop {
        crossbeam::select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                let outcome = match &job.kind {
                    JobKind::KeepAlive { var } => session.keep_alive_var(var).map(|()| None),
                    JobKind::Poll { var } => session.read(var).map(Some),
                };
                let outcome = outcome.map_err(|e| {
                    tracing::warn!("{:?} failed: {}", job.kind, e);
                    e.to_string()
                });

                // The receiver may be gone; keep ticking regardless
                let _ = events.send(JobEvent {
                    kind: job.kind.clone(),
                    at: Local::now(),
                    outcome,
                });
            }
        }
    }

    tracing::debug!("Stopped {:?}", job.kind);
}
