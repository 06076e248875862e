use std::sync::Once;

/// Crates whose `info` output drowns the lesson logs.
const QUIET_DEPENDENCIES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "nehe=debug,wgpu_core=warn"). When unset, `RUST_LOG` is consulted.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub default_level: log::LevelFilter,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            default_level: log::LevelFilter::Info,
        }
    }
}

static INIT: Once = Once::new();

/// Filter used when neither the config nor the environment gives one.
fn default_filter(level: log::LevelFilter) -> String {
    let mut filter = level.to_string().to_lowercase();
    for name in QUIET_DEPENDENCIES {
        filter.push_str(&format!(",{name}=warn"));
    }
    filter
}

/// Initializes the global logger once; later calls are ignored.
///
/// Call early in `main`, before `Runtime::run`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| default_filter(config.default_level));

        env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .init();

        log::debug!("logging initialized ({filter})");
    });
}
