use chrono::Utc;
use log::info;
use std::io::Write;

/// Initializes `env_logger` from `LOG_LEVEL` (default `info`).
///
/// `RUST_LOG`, when set, still wins so per-module filters keep working.
pub fn init() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = std::env::var("RUST_LOG").unwrap_or(level);

    let result = env_logger::Builder::new()
        .parse_filters(&filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    // A second init (tests, embedding apps) keeps the first logger.
    if result.is_ok() {
        info!("Logger initialized with filter '{}'", filter);
    }
}
