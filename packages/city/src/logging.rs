//! Global logging system.

use std::{
    fs::File,
    path::Path,
    sync::Arc,
    env,
    panic,
};
use anyhow::{Context, Result};
use backtrace::Backtrace;
use tracing_subscriber::{
    fmt::{
        self,
        time::uptime,
    },
    prelude::*,
    Registry,
    EnvFilter,
};


/// Default logging environment filter. Our crates are debug, everything else is warn.
const DEFAULT_FILTER: &'static str =
    "warn,city=debug,city_data=debug,cmp_format=debug,mesh_data=debug";

/// Installs a `tracing` logging backend which outputs to stdout and, if given, also a log file.
/// Accepts ecosystem-standard `RUST_LOG` env filters, and routes panics through the log.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let format = fmt::format()
        .compact()
        .with_timer(uptime())
        .with_line_number(true);
    let stdout_log = fmt::layer()
        .event_format(format);

    let file_log = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("unable to create log file {}", path.display()))?;
            Some(fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)))
        }
        None => None,
    };

    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }

    let subscriber = Registry::default()
        .with(EnvFilter::new(filter))
        .with(stdout_log)
        .with(file_log);
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to install log subscriber")?;
    info!("starting program");

    // make panic messages and backtrace go through logging system
    panic::set_hook(Box::new(|info| {
        error!("{}", info);
        if env::var("RUST_BACKTRACE").map(|val| val == "1").unwrap_or(true) {
            error!("{:?}", Backtrace::new());
        }
    }));
    trace!("installed custom panic hook");
    Ok(())
}
