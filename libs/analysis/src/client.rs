//! Submission and polling of one analysis job.

use std::fmt;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::errors::{Error, Result};
use crate::issues::RawIssue;
use crate::request::AnalysisRequest;
use crate::service::{AnalysisService, JobStatus, ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
  Submitting,
  Queued,
  Running,
  Succeeded,
  Failed,
  TimedOut,
}

impl fmt::Display for AnalysisStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      AnalysisStatus::Submitting => "submitting",
      AnalysisStatus::Queued => "queued",
      AnalysisStatus::Running => "running",
      AnalysisStatus::Succeeded => "succeeded",
      AnalysisStatus::Failed => "failed",
      AnalysisStatus::TimedOut => "timed out",
    };
    f.write_str(name)
  }
}

/// Terminal outcome of a job. `issues` is only populated on success.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
  pub uuid: Option<String>,
  pub status: AnalysisStatus,
  pub issues: Vec<RawIssue>,
  /// Service-side reason when the job failed.
  pub failure: Option<String>,
  /// Time since the client started, login included.
  pub elapsed: Duration,
}

/// Drives a job through `submitting -> queued -> running -> {succeeded | failed | timed out}`.
/// The deadline is client-side only: a timed-out job may still be running remotely.
pub struct AnalysisClient<S, C> {
  config: ClientConfig,
  service: S,
  clock: C,
}

enum Retried<T> {
  Done(T),
  DeadlineReached,
}

struct Job {
  uuid: String,
  status: AnalysisStatus,
  started: Duration,
}

impl Job {
  fn transition(&mut self, next: AnalysisStatus) {
    if self.status != next {
      tracing::info!(uuid = %self.uuid, from = %self.status, to = %next, "analysis status");
      self.status = next;
    }
  }
}

impl<S: AnalysisService, C: Clock> AnalysisClient<S, C> {
  pub fn new(config: ClientConfig, service: S, clock: C) -> Self {
    Self {
      config,
      service,
      clock,
    }
  }

  pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
    let started = self.clock.now();
    let timing = self.config.timing(request.mode);

    let token = self
      .service
      .login(&self.config.credentials)
      .map_err(fatal_error)?;

    tracing::info!(
      contract = %request.artifact.contract_name,
      mode = %request.mode,
      "submitting analysis"
    );
    let submission = self
      .service
      .submit(&token, &request.document())
      .map_err(submission_error)?;
    let deadline = self.clock.now() + timing.timeout;

    let mut job = Job {
      uuid: submission.uuid,
      status: AnalysisStatus::Submitting,
      started,
    };
    match submission.status {
      JobStatus::Finished => return self.finish(job, &token, deadline),
      JobStatus::Failed(reason) => return Ok(self.failed(job, reason)),
      pending => job.transition(pending_status(&pending)),
    }

    self.sleep_until(timing.initial_delay, deadline);
    let mut backoff = self.config.retry.initial_backoff;

    loop {
      if self.clock.now() >= deadline {
        return Ok(self.timed_out(job));
      }

      let uuid = job.uuid.clone();
      let status = match self.with_retries("status", deadline, || self.service.status(&token, &uuid))? {
        Retried::Done(status) => status,
        Retried::DeadlineReached => return Ok(self.timed_out(job)),
      };

      match status {
        JobStatus::Finished => return self.finish(job, &token, deadline),
        JobStatus::Failed(reason) => return Ok(self.failed(job, reason)),
        pending => job.transition(pending_status(&pending)),
      }

      self.sleep_until(backoff, deadline);
      backoff = (backoff * 2).min(self.config.retry.max_backoff);
    }
  }

  fn finish(&self, mut job: Job, token: &str, deadline: Duration) -> Result<AnalysisResult> {
    let uuid = job.uuid.clone();
    let issues = match self.with_retries("issues", deadline, || self.service.issues(token, &uuid))? {
      Retried::Done(issues) => issues,
      Retried::DeadlineReached => return Ok(self.timed_out(job)),
    };
    job.transition(AnalysisStatus::Succeeded);
    tracing::info!(uuid = %job.uuid, issues = issues.len(), "analysis finished");

    Ok(AnalysisResult {
      uuid: Some(job.uuid),
      status: job.status,
      issues,
      failure: None,
      elapsed: self.clock.now().saturating_sub(job.started),
    })
  }

  fn failed(&self, mut job: Job, reason: Option<String>) -> AnalysisResult {
    job.transition(AnalysisStatus::Failed);
    tracing::warn!(uuid = %job.uuid, reason = reason.as_deref().unwrap_or("unknown"), "analysis failed");
    AnalysisResult {
      uuid: Some(job.uuid),
      status: job.status,
      issues: Vec::new(),
      failure: Some(reason.unwrap_or_else(|| "analysis reported an error".to_string())),
      elapsed: self.clock.now().saturating_sub(job.started),
    }
  }

  fn timed_out(&self, mut job: Job) -> AnalysisResult {
    job.transition(AnalysisStatus::TimedOut);
    tracing::warn!(uuid = %job.uuid, "analysis deadline reached; the job may still be running");
    AnalysisResult {
      uuid: Some(job.uuid),
      status: job.status,
      issues: Vec::new(),
      failure: None,
      elapsed: self.clock.now().saturating_sub(job.started),
    }
  }

  /// Sleeps for `duration`, cut short at `deadline`.
  fn sleep_until(&self, duration: Duration, deadline: Duration) {
    let remaining = deadline.saturating_sub(self.clock.now());
    let nap = duration.min(remaining);
    if !nap.is_zero() {
      self.clock.sleep(nap);
    }
  }

  /// Calls `call` until it succeeds, fails permanently, or exhausts the retry budget. Pauses
  /// between attempts never cross `deadline`.
  fn with_retries<T>(
    &self,
    what: &str,
    deadline: Duration,
    mut call: impl FnMut() -> ServiceResult<T>,
  ) -> Result<Retried<T>> {
    let policy = self.config.retry;
    let mut attempt = 1;
    loop {
      match call() {
        Ok(value) => return Ok(Retried::Done(value)),
        Err(err) if err.is_transient() && attempt < policy.attempts => {
          tracing::warn!(call = what, attempt, error = %err, "transient service error, retrying");
          if self.clock.now() + policy.pause >= deadline {
            self.sleep_until(policy.pause, deadline);
            return Ok(Retried::DeadlineReached);
          }
          self.clock.sleep(policy.pause);
          attempt += 1;
        }
        Err(err) if err.is_transient() => {
          return Err(Error::TransientNetwork {
            attempts: attempt,
            message: err.to_string(),
          })
        }
        Err(err) => return Err(fatal_error(err)),
      }
    }
  }
}

fn pending_status(status: &JobStatus) -> AnalysisStatus {
  match status {
    JobStatus::Queued => AnalysisStatus::Queued,
    _ => AnalysisStatus::Running,
  }
}

fn submission_error(err: ServiceError) -> Error {
  match err {
    ServiceError::Http { status, body } if (400..500).contains(&status) && status != 429 => {
      Error::SubmissionRejected {
        status,
        message: body,
      }
    }
    ServiceError::Malformed(message) => Error::Protocol(message),
    other => Error::TransientNetwork {
      attempts: 1,
      message: other.to_string(),
    },
  }
}

fn fatal_error(err: ServiceError) -> Error {
  match err {
    ServiceError::Http { status, body } => Error::Rejected {
      status,
      message: body,
    },
    ServiceError::Malformed(message) => Error::Protocol(message),
    ServiceError::Transport(message) => Error::TransientNetwork {
      attempts: 1,
      message,
    },
  }
}
