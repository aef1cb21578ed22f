//! Process-wide defaults for launching tasks.
//!
//! Values come from [`Config::default`], from the environment via
//! [`Config::from_env`], or from an explicit [`init`] call made before the
//! first task is launched. Individual launches can override every field
//! through [`TaskBuilder`](crate::TaskBuilder).

use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable for the default thread name prefix.
pub const ENV_NAME_PREFIX: &str = "BOUND_THREADS_NAME_PREFIX";
/// Environment variable for the default stack size in bytes.
pub const ENV_STACK_SIZE: &str = "BOUND_THREADS_STACK_SIZE";
/// Environment variable for the default [`LeakPolicy`].
pub const ENV_ON_LEAK: &str = "BOUND_THREADS_ON_LEAK";

static GLOBAL: spin::Once<Config> = spin::Once::new();

/// What happens when a handle is dropped while still joinable.
///
/// Every variant logs at error level first; none of them is silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeakPolicy {
    /// Abort the process.
    #[default]
    Abort,
    /// Panic in the dropping thread. Aborts if that thread is already
    /// unwinding.
    Panic,
    /// Detach the execution unit and continue.
    Detach,
}

impl FromStr for LeakPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(LeakPolicy::Abort),
            "panic" => Ok(LeakPolicy::Panic),
            "detach" => Ok(LeakPolicy::Detach),
            other => Err(ConfigError::InvalidValue {
                key: ENV_ON_LEAK,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LeakPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeakPolicy::Abort => f.write_str("abort"),
            LeakPolicy::Panic => f.write_str("panic"),
            LeakPolicy::Detach => f.write_str("detach"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration already initialized")]
    AlreadyInitialized,
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Defaults applied to every launch that does not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Unnamed tasks are named `"{name_prefix}-{task_id}"`.
    pub name_prefix: String,
    /// Stack size for new threads; `None` uses the platform default.
    pub stack_size: Option<usize>,
    pub on_leak: LeakPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_prefix: "task".to_string(),
            stack_size: None,
            on_leak: LeakPolicy::default(),
        }
    }
}

impl Config {
    /// Read overrides from the environment on top of [`Config::default`].
    ///
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(prefix) = env::var(ENV_NAME_PREFIX) {
            config.name_prefix = prefix;
        }

        if let Ok(raw) = env::var(ENV_STACK_SIZE) {
            let size = raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_STACK_SIZE,
                value: raw.clone(),
            })?;
            config.stack_size = Some(size);
        }

        if let Ok(raw) = env::var(ENV_ON_LEAK) {
            config.on_leak = raw.parse()?;
        }

        Ok(config)
    }
}

/// Install the process-wide configuration.
///
/// Must run before the first launch reads the defaults; later calls fail.
pub fn init(config: Config) -> Result<(), ConfigError> {
    let mut installed = false;
    GLOBAL.call_once(|| {
        installed = true;
        config
    });

    if installed {
        tracing::debug!("task configuration installed");
        Ok(())
    } else {
        Err(ConfigError::AlreadyInitialized)
    }
}

/// The process-wide configuration.
///
/// Initialized from the environment on first use if [`init`] was never
/// called. A malformed environment falls back to the defaults.
pub fn global() -> &'static Config {
    GLOBAL.call_once(|| {
        Config::from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring malformed task configuration in environment");
            Config::default()
        })
    })
}
