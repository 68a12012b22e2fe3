// Timestamped, level-colored log lines for the CLI and its libraries

use colored::Colorize;
use fern::Dispatch;
use log::{Level, LevelFilter};

const LIBRARIES: [&str; 4] = ["padlink_guid", "padlink_devices", "padlink_mapping", "padlink_identity"];

pub(crate) fn format_line(level: Level, timestamp: &str, message: &str) -> String {
    let line = format!("[{timestamp}] {message}");
    match level {
        Level::Error => line.bright_red().to_string(),
        Level::Warn => line.bright_yellow().to_string(),
        Level::Info => line,
        Level::Debug | Level::Trace => line.dimmed().to_string(),
    }
}

/// Setup the logger. Library records share the binary's format.
///
/// Helper mode keeps stdout for its XML and logs uncolored to stderr.
pub fn setup(verbose: bool, no_color: bool, helper: bool) -> Result<(), log::SetLoggerError> {
    let (log_level, library_level) = if verbose {
        (LevelFilter::Debug, LevelFilter::Debug)
    } else {
        (LevelFilter::Info, LevelFilter::Warn)
    };
    let mut dispatch = Dispatch::new()
        .format(|out, message, record| {
            let now = chrono::Local::now().format("%Y.%m.%d %H:%M:%S").to_string();
            out.finish(format_args!("{}", format_line(record.level(), &now, &message.to_string())));
        })
        .level(LevelFilter::Error)
        .level_for("padlink", log_level);
    for library in LIBRARIES {
        dispatch = dispatch.level_for(library, library_level);
    }
    let dispatch = if helper {
        dispatch.chain(std::io::stderr())
    } else {
        dispatch.chain(std::io::stdout())
    };
    dispatch.apply()?;

    if no_color || helper {
        colored::control::set_override(false);
    }
    Ok(())
}
