use analysis::{HttpService, SystemClock};
use clap::error::ErrorKind;
use clap::Parser;

use sabre_rs::cli::Cli;
use sabre_rs::config::Settings;
use sabre_rs::logging::{init_logging, LogConfig};
use sabre_rs::pipeline::{Pipeline, SolcToolchain, EXIT_FAILURE, EXIT_INPUT, EXIT_SUCCESS};
use sabre_rs::report;

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) => {
      let code = match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
        _ => EXIT_INPUT,
      };
      let _ = err.print();
      std::process::exit(code);
    }
  };

  if let Err(error) = init_logging(&LogConfig::for_cli(cli.debug)) {
    eprintln!("error: {error:#}");
    std::process::exit(EXIT_FAILURE);
  }
  std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
  let settings = Settings::from_env();

  let toolchain = match SolcToolchain::new(settings.provisioner_config()) {
    Ok(toolchain) => toolchain,
    Err(error) => {
      eprintln!("error: {error}");
      return EXIT_FAILURE;
    }
  };
  let service = match HttpService::new(&settings.api_url, cli.debug) {
    Ok(service) => service,
    Err(error) => {
      eprintln!("error: {error}");
      return EXIT_FAILURE;
    }
  };

  let pipeline = Pipeline::new(toolchain, service, SystemClock::new(), settings.client_config());
  match pipeline.run(&cli.invocation()) {
    Ok(report) => match report::render(&report, cli.format) {
      Ok(rendered) => {
        println!("{rendered}");
        EXIT_SUCCESS
      }
      Err(error) => {
        eprintln!("error: failed to render report: {error}");
        EXIT_FAILURE
      }
    },
    Err(error) => {
      eprintln!("error: {error}");
      if error.is_retryable() {
        eprintln!("note: this failure may be temporary; try again later");
      }
      error.exit_code()
    }
  }
}
