use tracing_subscriber::EnvFilter;

/// Environment variable that overrides every other log setting
pub const LOG_ENV: &str = "CHECKTREE_LOG";

/// Filter used when `CHECKTREE_LOG` is unset: `-v` and `-vv` win over the
/// configured filter, which wins over `warn`.
pub fn default_directive(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured
            .filter(|f| !f.trim().is_empty())
            .unwrap_or("warn")
            .to_string(),
        1 => "checktree=debug".to_string(),
        _ => "checktree=trace".to_string(),
    }
}

/// Install the stderr subscriber. Later calls are ignored.
pub fn init(verbose: u8, configured: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, configured)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
