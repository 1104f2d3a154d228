//! The compile-and-submit pipeline.
//!
//! Stages run in order and stop at the first failure:
//! 1. **Version**: read the entry file and parse its `pragma solidity` constraint
//! 2. **Sources**: resolve the transitive import closure
//! 3. **Provision**: obtain a compiler snapshot satisfying the constraint
//! 4. **Compile**: build artifacts and select the target contract
//! 5. **Analyse**: submit, poll, and normalise the findings

use std::path::{Path, PathBuf};
use std::time::Duration;

use analysis::{
  AnalysisClient, AnalysisService, AnalysisStatus, ClientConfig, Clock, IssueNormalizer,
  RequestBuilder, RequestOptions,
};
use compiler::version::{extract_constraint, parse_constraint, resolve_release};
use compiler::{
  CompilationDriver, CompilerProvisioner, CompilerSnapshot, Constraint, FsSourceProvider,
  HttpFetcher, ProvisionerConfig, SolcSnapshot, SourceProvider, Stage,
};
use thiserror::Error;
use tracing::info;

use crate::report::Report;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_COMPILATION: i32 = 1;
pub const EXIT_FAILURE: i32 = 2;
pub const EXIT_TIMEOUT: i32 = 3;
/// `-1` as seen by the shell.
pub const EXIT_INPUT: i32 = 255;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Compiler(#[from] compiler::Error),

  #[error(transparent)]
  Analysis(#[from] analysis::Error),

  #[error("analysis {uuid} failed: {reason}")]
  AnalysisFailed { uuid: String, reason: String },

  #[error(
    "analysis {uuid} did not finish within {}s; it may still be running remotely",
    elapsed.as_secs()
  )]
  Timeout { uuid: String, elapsed: Duration },
}

impl PipelineError {
  pub fn exit_code(&self) -> i32 {
    match self {
      PipelineError::Compiler(err) => match err.stage() {
        Stage::Input => EXIT_INPUT,
        _ if matches!(err, compiler::Error::Compilation { .. }) => EXIT_COMPILATION,
        _ => EXIT_FAILURE,
      },
      PipelineError::Analysis(_) | PipelineError::AnalysisFailed { .. } => EXIT_FAILURE,
      PipelineError::Timeout { .. } => EXIT_TIMEOUT,
    }
  }

  /// Whether running the same command again later could succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      PipelineError::Analysis(err) => err.is_retryable(),
      PipelineError::Timeout { .. } => true,
      _ => false,
    }
  }
}

/// Supplies a compiler snapshot for a version constraint.
pub trait Toolchain {
  type Snapshot: CompilerSnapshot;

  fn snapshot(&self, constraint: &Constraint) -> compiler::Result<Self::Snapshot>;
}

/// Native solc binaries from the release mirror, cached on disk.
pub struct SolcToolchain {
  provisioner: CompilerProvisioner<HttpFetcher>,
}

impl SolcToolchain {
  pub fn new(config: ProvisionerConfig) -> compiler::Result<Self> {
    Ok(Self {
      provisioner: CompilerProvisioner::new(config, HttpFetcher::new()?),
    })
  }
}

impl Toolchain for SolcToolchain {
  type Snapshot = SolcSnapshot;

  fn snapshot(&self, constraint: &Constraint) -> compiler::Result<SolcSnapshot> {
    let index = self.provisioner.release_index()?;
    let release = resolve_release(constraint, &index)?;
    info!(version = %release.resolved_version, "provisioning solc");
    let provisioned = self.provisioner.provision(&release)?;
    SolcSnapshot::load(&provisioned)
  }
}

/// One command-line request.
#[derive(Debug, Clone)]
pub struct Invocation {
  pub file: PathBuf,
  pub contract: Option<String>,
  pub options: RequestOptions,
}

pub struct Pipeline<T, S, C> {
  toolchain: T,
  service: S,
  clock: C,
  client_config: ClientConfig,
}

impl<T: Toolchain, S: AnalysisService, C: Clock> Pipeline<T, S, C> {
  pub fn new(toolchain: T, service: S, clock: C, client_config: ClientConfig) -> Self {
    Self {
      toolchain,
      service,
      clock,
      client_config,
    }
  }

  pub fn run(&self, invocation: &Invocation) -> Result<Report, PipelineError> {
    let (provider, entry) = FsSourceProvider::for_entry(&invocation.file)?;
    let entry_source = provider
      .read(&entry)
      .map_err(|err| compiler::Error::io(&invocation.file, err))?;

    let constraint = parse_constraint(&extract_constraint(&entry_source, &entry)?)?;
    info!(file = %entry, constraint = constraint.as_str(), "version constraint");

    let sources = compiler::sources::resolve(&entry, &provider)?;
    let snapshot = self.toolchain.snapshot(&constraint)?;
    let artifact = CompilationDriver::new(&snapshot).compile(&sources, invocation.contract.as_deref())?;
    info!(contract = %artifact.contract_name, "compiled");

    let request = RequestBuilder::new(invocation.options.clone()).build(
      &artifact,
      &artifact.source_list,
      &sources,
    )?;
    let client = AnalysisClient::new(self.client_config.clone(), &self.service, &self.clock);
    let result = client.run(&request)?;
    let uuid = result.uuid.clone().unwrap_or_default();

    match result.status {
      AnalysisStatus::Succeeded => {
        let issues = IssueNormalizer::new(&request).normalize(result.issues);
        Ok(Report {
          file: display_path(&invocation.file),
          contract: artifact.contract_name,
          issues,
        })
      }
      AnalysisStatus::TimedOut => Err(PipelineError::Timeout {
        uuid,
        elapsed: result.elapsed,
      }),
      _ => Err(PipelineError::AnalysisFailed {
        uuid,
        reason: result
          .failure
          .unwrap_or_else(|| format!("analysis ended in state {}", result.status)),
      }),
    }
  }
}

fn display_path(path: &Path) -> String {
  path.display().to_string()
}
