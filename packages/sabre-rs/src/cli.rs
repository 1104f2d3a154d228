//! Command-line arguments.

use std::path::PathBuf;

use analysis::request::DEFAULT_TOOL_NAME;
use analysis::{AnalysisMode, RequestOptions};
use clap::{Parser, ValueEnum};

use crate::pipeline::Invocation;
use crate::report::Format;

#[derive(Debug, Parser)]
#[command(
  name = "sabre",
  version,
  about = "Compile a Solidity contract and submit it for security analysis",
  long_about = "Compile a Solidity contract with the solc version its pragma asks for and submit \
                it to the analysis service.\n\n\
                Credentials are read from MYTHX_ETH_ADDRESS and MYTHX_PASSWORD; without them \
                the trial identity is used."
)]
pub struct Cli {
  /// Solidity source file to analyse.
  #[arg(value_name = "FILE")]
  pub file: PathBuf,

  /// Contract to analyse (default: the last deployable contract in FILE).
  #[arg(value_name = "CONTRACT")]
  pub contract: Option<String>,

  /// Analysis depth.
  #[arg(long, value_enum, default_value_t = ModeArg::Quick)]
  pub mode: ModeArg,

  /// Report format.
  #[arg(long, value_enum, default_value_t = Format::Text)]
  pub format: Format,

  /// Tool name reported to the service.
  #[arg(long = "clientToolName", value_name = "NAME", default_value = DEFAULT_TOOL_NAME)]
  pub client_tool_name: String,

  /// Ask the service not to reuse results of an identical earlier submission.
  #[arg(long = "noCacheLookup")]
  pub no_cache_lookup: bool,

  /// Echo raw requests and responses to stderr and enable debug logging.
  #[arg(long)]
  pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
  Quick,
  Full,
}

impl From<ModeArg> for AnalysisMode {
  fn from(mode: ModeArg) -> Self {
    match mode {
      ModeArg::Quick => AnalysisMode::Quick,
      ModeArg::Full => AnalysisMode::Full,
    }
  }
}

impl Cli {
  pub fn invocation(&self) -> Invocation {
    Invocation {
      file: self.file.clone(),
      contract: self.contract.clone(),
      options: RequestOptions {
        mode: self.mode.into(),
        tool_name: self.client_tool_name.clone(),
        no_cache_lookup: self.no_cache_lookup,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use clap::error::ErrorKind;

  use super::*;

  #[test]
  fn defaults() {
    let cli = Cli::try_parse_from(["sabre", "Token.sol"]).expect("parse");
    let invocation = cli.invocation();
    assert_eq!(invocation.file, PathBuf::from("Token.sol"));
    assert_eq!(invocation.contract, None);
    assert_eq!(invocation.options, RequestOptions::default());
    assert_eq!(cli.format, Format::Text);
    assert!(!cli.debug);
  }

  #[test]
  fn all_options() {
    let cli = Cli::try_parse_from([
      "sabre",
      "contracts/Token.sol",
      "Token",
      "--mode",
      "full",
      "--format",
      "stylish",
      "--clientToolName",
      "ci-runner",
      "--noCacheLookup",
      "--debug",
    ])
    .expect("parse");
    let invocation = cli.invocation();
    assert_eq!(invocation.contract.as_deref(), Some("Token"));
    assert_eq!(invocation.options.mode, AnalysisMode::Full);
    assert_eq!(invocation.options.tool_name, "ci-runner");
    assert!(invocation.options.no_cache_lookup);
    assert_eq!(cli.format, Format::Stylish);
    assert!(cli.debug);
  }

  #[test]
  fn rejects_unknown_values() {
    let err = Cli::try_parse_from(["sabre", "Token.sol", "--mode", "deep"]).expect_err("invalid");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);

    let err = Cli::try_parse_from(["sabre"]).expect_err("missing file");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
  }

  #[test]
  fn version_flag_short_circuits_parsing() {
    let err = Cli::try_parse_from(["sabre", "--version"]).expect_err("version");
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
  }
}
