use clap::Parser;

use cluster_hybrid::adapter::inbound::cli::command::{CheckCommand, Cli, ColorChoice, Commands};
use cluster_hybrid::adapter::inbound::cli::output::{self, OutputConfig};
use cluster_hybrid::adapter::inbound::cli::{check, run};
use cluster_hybrid::infrastructure::runtime::RunOutcome;

/// Exit code for configuration and startup failures.
const EXIT_ERROR: i32 = 1;
/// Exit code after a daily loss halt.
const EXIT_HALTED: i32 = 2;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let code = match cli.command {
        Commands::Run(args) => match run::execute(&args).await {
            Ok(RunOutcome::Stopped) => 0,
            Ok(RunOutcome::Halted(reason)) => {
                output::error(&format!("Halted: {reason}"));
                EXIT_HALTED
            }
            Err(e) => {
                output::error(&e.to_string());
                EXIT_ERROR
            }
        },
        Commands::Check(CheckCommand::Config(arg)) => match check::execute_config(&arg.config) {
            Ok(()) => 0,
            Err(e) => {
                output::error(&e.to_string());
                EXIT_ERROR
            }
        },
    };

    std::process::exit(code);
}
