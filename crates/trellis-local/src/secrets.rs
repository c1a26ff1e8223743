/// Resolves external secret handles to values.
///
/// Implementations must treat values as sensitive: the executor injects them
/// into the job's environment and nothing else; they are never logged.
pub trait SecretStore: Send + Sync {
  fn resolve(&self, handle: &str) -> Option<String>;
}

/// Resolves secret handles from the evaluator's own environment.
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
  fn resolve(&self, handle: &str) -> Option<String> {
    std::env::var(handle).ok()
  }
}
