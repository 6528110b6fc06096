// src/config/mod.rs

//! Mission plan loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate task shapes, dependencies and acyclicity (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_plan_path, load_and_validate, load_from_path, parse_plan};
pub use model::{ConfigSection, PlanFile, RawPlanFile, TargetConfig, TaskConfig};
pub use validate::validate_plan;
