use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to an external unit of work, versioned by tag or branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsesRef {
  /// Path of the unit, e.g. "acme/actions/unit-testing".
  pub path: String,
  /// Tag or branch, e.g. "r1" or "dev".
  pub version: String,
}

impl UsesRef {
  /// Parse a "path@ref" form. Both halves must be non-empty.
  pub fn parse(raw: &str) -> Option<Self> {
    let (path, version) = raw.rsplit_once('@')?;
    if path.is_empty() || version.is_empty() {
      return None;
    }
    Some(Self {
      path: path.to_string(),
      version: version.to_string(),
    })
  }
}

impl fmt::Display for UsesRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.path, self.version)
  }
}
