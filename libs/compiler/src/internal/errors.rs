use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Input,
  VersionResolution,
  Provisioning,
  SourceResolution,
  Compilation,
}

/// Canonical error type used by every stage of the compiler crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// A file given by the user could not be read.
  #[error("failed to read {}: {message}", path.display())]
  Io { path: PathBuf, message: String },

  #[error("no `pragma solidity` version declared in {file}")]
  NoVersionDeclared { file: String },

  #[error("invalid solidity version constraint \"{constraint}\": {reason}")]
  InvalidVersionConstraint { constraint: String, reason: String },

  #[error("no solc release satisfies \"{constraint}\"")]
  NoMatchingRelease { constraint: String },

  /// The solc release index could not be fetched or parsed.
  #[error("failed to load solc release index: {0}")]
  ReleaseIndex(String),

  #[error("failed to download solc {version}: {reason}")]
  DownloadFailed { version: String, reason: String },

  #[error("solc snapshot {version} is not usable: {reason}")]
  IncompatibleSnapshot { version: String, reason: String },

  #[error("import \"{import}\" declared in {importer} could not be found")]
  ImportNotFound { import: String, importer: String },

  /// Error-severity diagnostics reported by the compiler.
  #[error("compilation failed:\n{diagnostics}")]
  Compilation { diagnostics: String },

  /// The compiler process itself failed or produced unreadable output.
  #[error("solc invocation failed: {0}")]
  CompilerInvocation(String),

  #[error("contract \"{name}\" not found; available contracts: {}", available.join(", "))]
  ContractNotFound { name: String, available: Vec<String> },

  #[error("no deployable contract found in {file}")]
  NoDeployableContract { file: String },
}

impl Error {
  pub fn io(path: impl Into<PathBuf>, cause: impl Display) -> Self {
    Error::Io {
      path: path.into(),
      message: cause.to_string(),
    }
  }

  pub fn stage(&self) -> Stage {
    match self {
      Error::Io { .. } => Stage::Input,
      Error::NoVersionDeclared { .. }
      | Error::InvalidVersionConstraint { .. }
      | Error::NoMatchingRelease { .. } => Stage::VersionResolution,
      Error::ReleaseIndex(_) | Error::DownloadFailed { .. } | Error::IncompatibleSnapshot { .. } => {
        Stage::Provisioning
      }
      Error::ImportNotFound { .. } => Stage::SourceResolution,
      Error::Compilation { .. }
      | Error::CompilerInvocation(_)
      | Error::ContractNotFound { .. }
      | Error::NoDeployableContract { .. } => Stage::Compilation,
    }
  }
}

/// Result alias bound to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Annotate an error from `result` with `context`, producing a [`Error::CompilerInvocation`].
pub(crate) fn map_invocation_error<T, E>(
  result: std::result::Result<T, E>,
  context: impl AsRef<str>,
) -> Result<T>
where
  E: Display,
{
  result.map_err(|err| Error::CompilerInvocation(format!("{}: {err}", context.as_ref())))
}
