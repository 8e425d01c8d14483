// ABOUTME: Azure CLI integration layer.
// ABOUTME: Exposes the typed client, request types, and cloud errors.

mod client;
mod error;

pub use client::{AzureCli, ContainerRequest, RegistryCredential};
pub use error::{CloudError, CloudErrorKind};
