//! Logger set-up for the CLI. Library code only talks to the `log` facade;
//! this module decides where the messages go.
use std::env;
use std::io::IsTerminal;

use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::Dispatch;
use log::LevelFilter;

/// Environment variable that overrides the log level given on the command line
pub const LOG_LEVEL_ENV: &str = "PVFM_LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "warn";

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.to_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        unknown => Err(format!("Unknown log level: {unknown}")),
    }
}

/// Send log records to stderr, coloured when stderr is a terminal.
///
/// `PVFM_LOG_LEVEL` wins over `level_from_args`; without either the level
/// is `warn`. Stdout stays reserved for command output.
pub fn init(level_from_args: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = env::var(LOG_LEVEL_ENV)
        .ok()
        .or_else(|| level_from_args.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let level = parse_level(&level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = std::io::stderr().is_terminal();

    Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = Local::now().format("%H:%M:%S");
            if use_colour {
                out.finish(format_args!(
                    "[{timestamp} {} {}] {message}",
                    colours.color(record.level()),
                    record.target()
                ));
            } else {
                out.finish(format_args!(
                    "[{timestamp} {} {}] {message}",
                    record.level(),
                    record.target()
                ));
            }
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
