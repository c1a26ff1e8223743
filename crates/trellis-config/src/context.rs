use serde::{Deserialize, Serialize};

/// The kind of event that created a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
  Push,
  Dispatch,
  Schedule,
}

impl Event {
  pub fn as_str(&self) -> &'static str {
    match self {
      Event::Push => "push",
      Event::Dispatch => "dispatch",
      Event::Schedule => "schedule",
    }
  }
}

/// The trigger context for one run.
///
/// Constructed once when the run is created and threaded explicitly through
/// scheduling and condition evaluation; it is never read from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
  /// The event that started the run.
  pub event: Event,
  /// The ref the run was created for, e.g. "refs/heads/main" or
  /// "refs/tags/v1.2.0". Empty for schedule runs.
  #[serde(default)]
  pub ref_name: String,
  /// Whether the ref is a tag.
  #[serde(default)]
  pub is_tag: bool,
}

impl TriggerContext {
  pub fn push(ref_name: impl Into<String>, is_tag: bool) -> Self {
    Self {
      event: Event::Push,
      ref_name: ref_name.into(),
      is_tag,
    }
  }

  pub fn dispatch(ref_name: impl Into<String>) -> Self {
    Self {
      event: Event::Dispatch,
      ref_name: ref_name.into(),
      is_tag: false,
    }
  }

  pub fn schedule() -> Self {
    Self {
      event: Event::Schedule,
      ref_name: String::new(),
      is_tag: false,
    }
  }
}
