// ABOUTME: Error types for provisioning operations.
// ABOUTME: Aggregates cloud and engine failures plus the taken-name case.

use crate::cloud::CloudError;
use crate::engine::EngineError;

/// Errors that can occur during provisioning state transitions.
///
/// Cloud and engine failures pass through unchanged so the failing tool's
/// stderr reaches the user verbatim. `ContainerNameTaken` is the one case
/// this layer raises itself: deploy is deliberately create-if-absent.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(
        "container instance '{0}' already exists; delete it or pick another container name"
    )]
    ContainerNameTaken(String),
}
