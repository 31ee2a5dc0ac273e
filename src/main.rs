use std::process::ExitCode;
use clap::Parser;
use traceroute::cli::Cli;
use traceroute::config::TraceConfig;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = TraceConfig::load();
    log::debug!("using {config:?}");

    match traceroute::run(&cli.hostname, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("traceroute: {e}");
            ExitCode::FAILURE
        }
    }
}
