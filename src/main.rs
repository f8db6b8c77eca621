use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{error, info};

use gpufand::{
    application::Application,
    cli::{Cli, LogLevel},
    config::Config,
    controller::Outcome,
};

fn init_log(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("{e}"))
}

async fn run(cli: &Cli) -> gpufand::error::Result<Outcome> {
    let config = Config::new(cli.interval_secs, cli.base_temperature)?;
    Application::builder()
        .with_config(config)
        .build()?
        .run()
        .await
}

/// Process exit status: 0 on interrupt, otherwise the error's code.
fn exit_status(result: gpufand::error::Result<Outcome>) -> u8 {
    match result {
        Ok(Outcome::Interrupted) => {
            info!("Interrupted, exiting");
            0
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_log(cli.log_level) {
        eprintln!("Unable to initialise logging: {e}");
        return ExitCode::from(2);
    }

    ExitCode::from(exit_status(run(&cli).await))
}
