use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Level used when `RUST_LOG` is not set.
pub fn default_level(debug: bool) -> LevelFilter {
    if debug { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Resolve the effective level; a parseable `RUST_LOG` wins.
pub fn resolve_level(debug: bool, rust_log: Option<&str>) -> LevelFilter {
    rust_log
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or_else(|| default_level(debug))
}

/// Initialize logging to stderr, or appended to `log_file` when given.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let log_level = resolve_level(debug, rust_log.as_deref());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level).format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {} - {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    // Module-specific directives like RUST_LOG=ssh_auditor::scan=debug.
    if let Some(spec) = rust_log.as_deref().filter(|s| s.contains('=')) {
        builder.parse_filters(spec);
    }

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.try_init()?;

    log::debug!("[logging] initialized: level={} file={:?}", log_level, log_file);
    Ok(())
}
