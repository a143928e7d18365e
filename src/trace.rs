use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the level derived from `-v`/`-q`.
pub const LOG_ENV: &str = "FLOWTAG_LOG";

/// Installs the global subscriber. Diagnostics go to stderr so stdout only
/// carries the final status line.
pub fn init(color: bool, json: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // Ignore errors when setting, since tests can initialize this
    // multiple times.
    let _ = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.with_ansi(color).try_init()
    };
}

/// The filter directives to use for a given verbosity, unless overridden
/// through [`LOG_ENV`].
pub fn levels(level: &str) -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| format!("flowtag={level}"))
}
