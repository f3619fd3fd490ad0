//! Configuration for cairn.
//!
//! Configuration is written in TOML. Every key is optional and falls back
//! to the defaults below; unknown keys are rejected.
//!
//! ```toml
//! [feed]
//! window = 20          # live community goals fetched per refresh
//! supplemental = true  # allow the built-in example entries as filler
//! fill_below = 20      # include filler while fewer live entries than this
//!
//! [mutation]
//! timeout_ms = 10000   # bound on every remote mutation
//!
//! [log]
//! filter = "info"      # tracing filter, overridden by RUST_LOG
//! ```
//!
//! Cairn looks for `$XDG_CONFIG_HOME/cairn/config.toml` (or the platform
//! equivalent) when no explicit path is given.

pub mod error;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::{ConfigError, Result};
use serde::Deserialize;

/// Parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub feed: FeedConfig,
	pub mutation: MutationConfig,
	pub log: LogConfig,
}

/// Community feed composition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
	/// Maximum live goals fetched per refresh.
	pub window: usize,
	/// Whether the supplemental example entries may be shown.
	pub supplemental: bool,
	/// Supplemental entries are appended while the live source has fewer entries than this.
	pub fill_below: usize,
}

impl Default for FeedConfig {
	fn default() -> Self {
		Self {
			window: 20,
			supplemental: true,
			fill_below: 20,
		}
	}
}

/// Remote mutation policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MutationConfig {
	/// Milliseconds before a pending mutation is abandoned and rolled back.
	pub timeout_ms: u64,
}

impl Default for MutationConfig {
	fn default() -> Self {
		Self { timeout_ms: 10_000 }
	}
}

impl MutationConfig {
	pub const fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `tracing_subscriber::EnvFilter` directive string.
	pub filter: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self { filter: "info".into() }
	}
}

impl Config {
	/// Parses and validates a TOML string.
	pub fn from_toml(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %path.display(), "config loaded");
		Ok(config)
	}

	/// Loads `explicit` if given; otherwise the default location if it exists,
	/// falling back to built-in defaults.
	pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
		if let Some(path) = explicit {
			return Self::load(path);
		}
		match default_path() {
			Some(path) if path.is_file() => Self::load(path),
			_ => Ok(Self::default()),
		}
	}

	/// Rejects values that parse but cannot work.
	pub fn validate(&self) -> Result<()> {
		if self.feed.window == 0 {
			return Err(ConfigError::Invalid {
				field: "feed.window",
				reason: "must be at least 1".into(),
			});
		}
		if self.mutation.timeout_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "mutation.timeout_ms",
				reason: "must be at least 1".into(),
			});
		}
		if self.log.filter.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "log.filter",
				reason: "must not be empty".into(),
			});
		}
		Ok(())
	}
}

/// Default configuration file location.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("cairn").join("config.toml"))
}
