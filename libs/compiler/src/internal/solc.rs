use foundry_compilers::artifacts::{CompilerOutput, SolcInput};
use foundry_compilers::solc::Solc;
use semver::Version;

use super::errors::{map_invocation_error, Error, Result};
use crate::provision::ProvisionedCompiler;

/// Invocation contract every compiler snapshot must honour: standard-JSON input
/// in, diagnostics and artifacts out.
pub trait CompilerSnapshot {
  fn version(&self) -> &Version;
  fn compile(&self, input: &SolcInput) -> Result<CompilerOutput>;
}

/// A native solc binary driven through `--standard-json`.
#[derive(Debug, Clone)]
pub struct SolcSnapshot {
  solc: Solc,
}

impl SolcSnapshot {
  /// Probes the binary's `--version` output and checks it against the provisioned version.
  pub fn load(provisioned: &ProvisionedCompiler) -> Result<Self> {
    let incompatible = |reason: String| Error::IncompatibleSnapshot {
      version: provisioned.version.to_string(),
      reason,
    };

    let reported = Solc::version(&provisioned.path).map_err(|err| incompatible(err.to_string()))?;
    let reported = Version::new(reported.major, reported.minor, reported.patch);
    if reported != provisioned.version {
      return Err(incompatible(format!("binary reports version {reported}")));
    }

    tracing::debug!(version = %reported, path = %provisioned.path.display(), "loaded solc");
    Ok(Self {
      solc: Solc::new_with_version(&provisioned.path, reported),
    })
  }
}

impl CompilerSnapshot for SolcSnapshot {
  fn version(&self) -> &Version {
    &self.solc.version
  }

  fn compile(&self, input: &SolcInput) -> Result<CompilerOutput> {
    map_invocation_error(self.solc.compile_as(input), "Solc compilation failed")
  }
}

impl<T: CompilerSnapshot + ?Sized> CompilerSnapshot for Box<T> {
  fn version(&self) -> &Version {
    (**self).version()
  }

  fn compile(&self, input: &SolcInput) -> Result<CompilerOutput> {
    (**self).compile(input)
  }
}
