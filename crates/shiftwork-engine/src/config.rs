//! Engine settings.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use shiftwork_import::ImportLimits;

use crate::Result;

/// Deserializable engine configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  #[serde(flatten)]
  pub limits:             ImportLimits,
  /// Case-insensitive patterns; an employee name matching any of them is
  /// never auto-provisioned by an import.
  pub provision_denylist: Vec<String>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      limits:             ImportLimits::default(),
      provision_denylist: vec![r"^system\s".to_string()],
    }
  }
}

/// Compiled form of [`EngineConfig::provision_denylist`].
#[derive(Debug, Clone, Default)]
pub struct Denylist(Vec<Regex>);

impl Denylist {
  pub fn compile(patterns: &[String]) -> Result<Self> {
    let compiled = patterns
      .iter()
      .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self(compiled))
  }

  pub fn is_match(&self, name: &str) -> bool { self.0.iter().any(|re| re.is_match(name.trim())) }
}
