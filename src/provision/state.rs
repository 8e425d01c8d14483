// ABOUTME: Provisioning state types for the type state pattern.
// ABOUTME: States carry the values threaded from one step to the next.

use crate::cloud::RegistryCredential;
use crate::types::{Endpoint, ImageRef};

/// Which path the credential step took. Exists only to drive the
/// propagation-retry policy in deploy; the credential itself is identical
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// A new service principal was created, together with its role
    /// assignment. The directory may not have propagated it yet.
    Created,
    /// An existing principal had its secret reset; the role assignment
    /// predates this run.
    Rotated,
}

/// Initial state: parameters resolved, nothing verified yet.
/// Available actions: `ensure_group()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Resource group verified or created.
/// Available actions: `ensure_registry()`
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupReady;

/// Registry verified or created.
/// Available actions: `tag_image()`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryReady;

/// Registry address resolved and the local image tagged for it.
/// Available actions: `ensure_credential()`
#[derive(Debug, Clone)]
pub struct Tagged {
    pub(crate) login_server: String,
    pub(crate) image: ImageRef,
}

/// Pull credential in hand, freshly minted on either path.
/// Available actions: `push()`
#[derive(Debug, Clone)]
pub struct CredentialReady {
    pub(crate) login_server: String,
    pub(crate) image: ImageRef,
    pub(crate) credential: RegistryCredential,
    pub(crate) outcome: CredentialOutcome,
}

/// Image pushed to the registry.
/// Available actions: `deploy()`
#[derive(Debug, Clone)]
pub struct Published {
    pub(crate) login_server: String,
    pub(crate) image: ImageRef,
    pub(crate) credential: RegistryCredential,
    pub(crate) outcome: CredentialOutcome,
}

/// Container instance created.
/// Available actions: `resolve_endpoint()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployed;

/// Terminal state: endpoint resolved.
/// Available actions: `endpoint()`, `finish()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) endpoint: Endpoint,
}
