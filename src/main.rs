use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{debug, error, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use yarder::cloud::s3::S3Store;
use yarder::config::{log_level_from_env, YarderConfig};
use yarder::constants::VERSION;
use yarder::error::YarderError;
use yarder::pipeline::{Pipeline, Stage};

fn main() -> ExitCode {
    let (log_level, rejected_level) = log_level_from_env();
    if let Err(e) = initialize_logging(log_level) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    if let Some(value) = rejected_level {
        warn!("Ignoring unknown log level '{}', using {}", value, log_level);
    }

    info!("Yarder {}", VERSION);

    match run() {
        Ok(()) => {
            info!("Yarder run completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the requested level
fn initialize_logging(level: LevelFilter) -> Result<()> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Load the configuration and drive one pipeline run
fn run() -> Result<()> {
    debug!("Stage {} -> {}", Stage::Init, Stage::Configuring);
    let config = YarderConfig::from_env()?;
    info!(
        "Configured: log_file={} output_file={} duration={:?} bucket={} path={} region={}",
        config.log_file.display(),
        config.output_file.display(),
        config.duration,
        config.s3_bucket,
        config.s3_path,
        config.aws_region
    );

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    let store = S3Store::new(&config.aws_region)?;
    debug!("Using S3 region {}", store.region().name());

    let report = runtime.block_on(Pipeline::new(&config, &store).run())?;
    info!(
        "Shipped {} ({} bytes captured over {:?}) to s3://{}/{}",
        report.archive.display(),
        report.capture.bytes_captured,
        report.capture.elapsed,
        report.upload.bucket,
        report.upload.key
    );
    Ok(())
}

/// Log the stage hint and the error chain once
fn report_failure(err: &anyhow::Error) {
    let hint = err
        .downcast_ref::<YarderError>()
        .map(YarderError::hint)
        .unwrap_or("There was an error starting Yarder. Please evaluate the error and try again");
    error!("{}", hint);
    error!("{:#}", err);
}
