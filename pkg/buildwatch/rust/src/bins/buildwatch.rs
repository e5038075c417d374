// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::Result;
use buildwatch::cli::Args;
use buildwatch::daemon;
use buildwatch::shutdown::TerminationSignals;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::info;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.is_enabled() && args.restart_target().is_empty() {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "one of --program, --group or --any is required unless --disabled",
            )
            .exit();
    }

    SimpleLogger::new()
        .with_level(args.log_level.to_level_filter())
        .with_utc_timestamps()
        .init()?;
    info!("buildwatch starting (version {})", env!("CARGO_PKG_VERSION"));

    let signals = TerminationSignals::register()?;
    daemon::run(args, signals).await?;

    info!("buildwatch shutting down");
    Ok(())
}
