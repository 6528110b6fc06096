// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Read a plan file and deserialize it without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_plan(&contents)
}

/// Deserialize plan TOML held in memory.
pub fn parse_plan(contents: &str) -> Result<RawPlanFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a plan file and validate it.
///
/// This is the entry point the binary uses:
///
/// - Reads TOML and applies defaults.
/// - Checks global settings, task shapes, `after` references and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(&path)?;
    PlanFile::try_from(raw)
}

/// Plan path used when `--plan` is not given.
pub fn default_plan_path() -> PathBuf {
    PathBuf::from("Mission.toml")
}
