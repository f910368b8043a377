//! Handler for the `run` command.

use tokio::sync::watch;
use tracing::{error, info};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime::RunOutcome;

/// Load the configuration, apply command-line overrides and run the loop
/// until Ctrl-C or a risk halt.
///
/// # Errors
///
/// Fails on configuration errors and on wiring failures before the first
/// tick. Errors inside the loop never escape it.
pub async fn execute(args: &RunArgs) -> Result<RunOutcome> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args);

    print_startup(&config);
    let mut log_handle = config.init_logging();

    let outcome = run_with_config(&config).await;
    match &outcome {
        Ok(RunOutcome::Stopped) => info!("cluster-hybrid stopped"),
        Ok(RunOutcome::Halted(reason)) => error!(reason = %reason, "Halted by risk supervisor; manual restart required"),
        Err(e) => error!(error = %e, "Startup failed"),
    }
    log_handle.close();
    outcome
}

async fn run_with_config(config: &Config) -> Result<RunOutcome> {
    let adapters = bootstrap::build_adapters(config).await?;
    let runtime = bootstrap::build_runtime(config, adapters).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    Ok(runtime.run(shutdown_rx).await)
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if args.dry_run {
        config.dry_run = true;
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }
}

fn print_startup(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Symbol", output::highlight(&config.symbol));
    output::field("Engines", config.enabled_engines().count());
    if config.dry_run {
        output::warning("Dry-run mode enabled - orders go to a paper account");
    }
}
