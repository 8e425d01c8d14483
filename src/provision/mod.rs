// ABOUTME: Provisioning orchestration using the type state pattern.
// ABOUTME: Exports state markers and the Provision struct for compile-time safe runs.

mod error;
mod run;
mod state;
mod transitions;

pub use error::ProvisionError;
pub use run::Provision;
pub use state::{
    Completed, CredentialOutcome, CredentialReady, Deployed, GroupReady, Initialized, Published,
    RegistryReady, Tagged,
};
