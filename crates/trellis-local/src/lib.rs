//! Local process executor for Trellis.
//!
//! Runs each job as a local process: the `uses` reference is mapped to an
//! executable under a units directory, resolved inputs become `INPUT_*`
//! environment variables, secret bindings are resolved through a
//! [`SecretStore`] and injected by name, and the job publishes outputs by
//! appending `name=value` lines to the file named by `TRELLIS_OUTPUT`.

mod executor;
mod secrets;

pub use executor::ProcessExecutor;
pub use secrets::{EnvSecretStore, SecretStore};
