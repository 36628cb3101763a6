//! Channel rules configuration.
//!
//! The rules file is a TOML document with two tables:
//!
//! ```toml
//! [categories]
//! "央视频道" = ["CCTV1", "CCTV2"]
//!
//! [aliases]
//! "CCTV1" = ["CCTV-1", "CCTV-1 HD", "CCTV1 HD"]
//! ```
//!
//! `categories` maps a group label to its member canonical names; `aliases`
//! maps a canonical name to its accepted alternate spellings. The file is
//! loaded once per run and is immutable afterwards; a file that cannot be
//! read or parsed aborts the run before any merge begins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRules {
    /// Group label -> member canonical names.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Canonical name -> accepted alternate spellings.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl ChannelRules {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!("cannot read rules file {}: {e}", path.display()))
        })?;
        let rules: ChannelRules = toml::from_str(&contents).map_err(|e| {
            AppError::configuration(format!("cannot parse rules file {}: {e}", path.display()))
        })?;
        Ok(rules)
    }
}
