use slog::{o, Drain, Level, Logger};

/// Builds a logger that writes plain text records to stderr
///
/// # Arguments
/// * `level` - Records below this level are dropped
pub fn terminal_logger(level: Level) -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build();
    let drain = slog::LevelFilter::new(drain, level).fuse();

    Logger::root(drain, o!("crate" => "meshmirror"))
}

/// A logger that swallows every record
pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}
