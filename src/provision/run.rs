// ABOUTME: Generic provisioning struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::cloud::RegistryCredential;
use crate::config::Params;
use crate::types::{Endpoint, ImageRef};

use super::state::{Completed, CredentialOutcome, CredentialReady, Initialized, Published, Tagged};

/// A provisioning run in progress, parameterized by its current state.
///
/// The state type parameter `S` carries the values produced so far (registry
/// address, tagged image, credential) directly in the state type, so a step
/// cannot run before the values it needs exist.
#[derive(Debug)]
pub struct Provision<S> {
    pub(crate) params: Params,
    pub(crate) state: S,
}

impl Provision<Initialized> {
    /// Begin a run from a resolved parameter set.
    pub fn new(params: Params) -> Self {
        Provision {
            params,
            state: Initialized,
        }
    }
}

impl<S> Provision<S> {
    /// The immutable parameter set for this run.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

// State-specific accessors for the threaded values.

impl Provision<Tagged> {
    /// The registry-qualified image reference.
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }

    /// The registry's public address.
    pub fn login_server(&self) -> &str {
        &self.state.login_server
    }
}

impl Provision<CredentialReady> {
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }

    pub fn credential(&self) -> &RegistryCredential {
        &self.state.credential
    }

    pub fn outcome(&self) -> CredentialOutcome {
        self.state.outcome
    }
}

impl Provision<Published> {
    pub fn image(&self) -> &ImageRef {
        &self.state.image
    }
}

impl Provision<Completed> {
    /// The resolved public endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.state.endpoint
    }

    /// Consume the run and return the endpoint.
    pub fn finish(self) -> Endpoint {
        self.state.endpoint
    }
}
