//! Search configuration.
//!
//! Loaded from JSON, then optionally overridden from the environment:
//!
//! ```json
//! { "batch_size": 500, "weigher": "intensity" }
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SCISSORS_BATCH_SIZE` | `batch_size` |
//! | `SCISSORS_WEIGHER` | `weigher` |

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::concurrency::DEFAULT_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::graph::WeigherKind;

/// Environment variable overriding [`SearchConfig::batch_size`].
pub const BATCH_SIZE_VAR: &str = "SCISSORS_BATCH_SIZE";
/// Environment variable overriding [`SearchConfig::weigher`].
pub const WEIGHER_VAR: &str = "SCISSORS_WEIGHER";

/// Tunables for background searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Vertices settled between progress reports. At least 1.
    pub batch_size: usize,
    /// Edge weight function for image graphs.
    pub weigher: WeigherKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            weigher: WeigherKind::default(),
        }
    }
}

impl SearchConfig {
    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in config {}", path.display()))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Applies `SCISSORS_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name; `lookup` returns `None` for unset.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(raw) = lookup(BATCH_SIZE_VAR) {
            self.batch_size = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{BATCH_SIZE_VAR}=`{raw}` is not a count")))?;
        }
        if let Some(raw) = lookup(WEIGHER_VAR) {
            self.weigher = raw.parse()?;
        }
        self.validate()?;
        Ok(self)
    }
}
