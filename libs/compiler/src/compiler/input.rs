use std::path::PathBuf;

use foundry_compilers::artifacts::{SolcInput, SolcLanguage, Source, Sources};
use semver::Version;

use crate::internal::errors::Result;
use crate::internal::settings::analysis_settings;
use crate::sources::SourceSet;

/// Standard-JSON input naming every unit of `sources`, sanitised for `version`.
pub(crate) fn build_input(sources: &SourceSet, version: &Version) -> Result<SolcInput> {
  let mut solc_sources = Sources::new();
  for unit in sources.iter() {
    solc_sources.insert(
      PathBuf::from(&unit.logical_path),
      Source::new(unit.content.clone()),
    );
  }

  let mut input = SolcInput::new(SolcLanguage::Solidity, solc_sources, analysis_settings()?);
  input.sanitize(version);
  Ok(input)
}
