//! Solidity compilation for analysis: version pragma resolution, compiler snapshot
//! provisioning, transitive import resolution, and contract artifact extraction.

pub mod ast;
pub mod compiler;
mod internal;
pub mod provision;
pub mod release;
pub mod sources;
pub mod version;

pub use foundry_compilers::artifacts::{CompilerOutput, SolcInput};

pub use compiler::{CompilationDriver, CompiledArtifact, Diagnostic, SeverityLevel};
pub use internal::errors::{Error, Result, Stage};
pub use internal::path::{normalize_logical, resolve_logical_import};
pub use internal::solc::{CompilerSnapshot, SolcSnapshot};
pub use provision::{
  CompilerProvisioner, FetchError, HttpFetcher, ProvisionedCompiler, ProvisionerConfig,
  SnapshotFetcher,
};
pub use release::{CompilerRelease, ReleaseEntry, ReleaseIndex};
pub use sources::{FsSourceProvider, SourceProvider, SourceSet, SourceUnit};
pub use version::Constraint;
