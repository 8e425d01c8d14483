// ABOUTME: State transition methods for the provisioning sequence.
// ABOUTME: Each method consumes self and returns the next state on success.

use tracing::{debug, info, warn};

use crate::cloud::{AzureCli, CloudError, ContainerRequest, RegistryCredential};
use crate::engine::EngineCli;
use crate::exec::CommandRunner;
use crate::types::Endpoint;

use super::error::ProvisionError;
use super::state::{
    Completed, CredentialOutcome, CredentialReady, Deployed, GroupReady, Initialized, Published,
    RegistryReady, Tagged,
};
use super::Provision;

impl<S> Provision<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self, state: T) -> Provision<T> {
        Provision {
            params: self.params,
            state,
        }
    }
}

// =============================================================================
// Initialized -> GroupReady
// =============================================================================

impl Provision<Initialized> {
    /// Ensure the resource group exists, creating it if absent.
    ///
    /// The provider exposes a dedicated existence predicate for groups, so
    /// this is a clean check-then-create. A conflict from the create call
    /// means the check lost a race; that is still success.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Cloud` if the existence query or the create
    /// call fails.
    #[must_use = "provisioning state must be used"]
    pub async fn ensure_group<R: CommandRunner>(
        self,
        az: &AzureCli<R>,
    ) -> Result<Provision<GroupReady>, ProvisionError> {
        let name = &self.params.resource_group;

        if az.group_exists(name).await? {
            debug!(group = %name, "resource group already exists");
            return Ok(self.transition(GroupReady));
        }

        match az.create_group(name, &self.params.location).await {
            Ok(()) => info!(group = %name, location = %self.params.location, "created resource group"),
            Err(CloudError::AlreadyExists { .. }) => {
                debug!(group = %name, "resource group appeared between check and create");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.transition(GroupReady))
    }
}

// =============================================================================
// GroupReady -> RegistryReady
// =============================================================================

impl Provision<GroupReady> {
    /// Ensure the container registry exists, creating it if absent.
    ///
    /// ACR has no boolean existence query; the show probe failing with
    /// not-found signals absence. Any other probe failure is fatal.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Cloud` if the probe fails for any reason
    /// other than absence, or if the create call fails.
    #[must_use = "provisioning state must be used"]
    pub async fn ensure_registry<R: CommandRunner>(
        self,
        az: &AzureCli<R>,
    ) -> Result<Provision<RegistryReady>, ProvisionError> {
        let name = &self.params.registry;
        let group = &self.params.resource_group;

        match az.show_registry(name, group).await {
            Ok(()) => {
                debug!(registry = %name, "registry already exists");
            }
            Err(CloudError::NotFound { .. }) => {
                match az
                    .create_registry(name, group, self.params.registry_sku.as_str())
                    .await
                {
                    Ok(()) => info!(registry = %name, "created registry"),
                    Err(CloudError::AlreadyExists { .. }) => {
                        debug!(registry = %name, "registry appeared between probe and create");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.transition(RegistryReady))
    }
}

// =============================================================================
// RegistryReady -> Tagged
// =============================================================================

impl Provision<RegistryReady> {
    /// Resolve the registry's address and tag the local image for it.
    ///
    /// Composition is exact: the registry-qualified reference is
    /// `{address}/{name}:{tag}` with the address taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Cloud` if the address lookup fails, or
    /// `ProvisionError::Engine` if the tag operation fails.
    #[must_use = "provisioning state must be used"]
    pub async fn tag_image<R: CommandRunner, E: CommandRunner>(
        self,
        az: &AzureCli<R>,
        engine: &EngineCli<E>,
    ) -> Result<Provision<Tagged>, ProvisionError> {
        let login_server = az.registry_login_server(&self.params.registry).await?;
        let target = self.params.image.in_registry(&login_server);

        engine.tag(&self.params.image, &target).await?;
        debug!(image = %target, "tagged image for registry");

        Ok(self.transition(Tagged {
            login_server,
            image: target,
        }))
    }
}

// =============================================================================
// Tagged -> CredentialReady
// =============================================================================

impl Provision<Tagged> {
    /// Obtain a pull credential for the registry: find the service
    /// principal by display name and rotate its secret, or create it with
    /// the acrpull role when absent.
    ///
    /// Every run mints a fresh secret either way; a pull-only principal
    /// never keeps a long-lived one.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Cloud` if any of the directory operations
    /// fail.
    #[must_use = "provisioning state must be used"]
    pub async fn ensure_credential<R: CommandRunner>(
        self,
        az: &AzureCli<R>,
    ) -> Result<Provision<CredentialReady>, ProvisionError> {
        let identity = &self.params.identity;

        let (credential, outcome) = match az.find_service_principal(identity).await? {
            Some(app_id) => {
                let secret = az.reset_credential(&app_id).await?;
                info!(identity = %identity, "rotated service principal credential");
                (RegistryCredential { app_id, secret }, CredentialOutcome::Rotated)
            }
            None => {
                let scope = az
                    .registry_id(&self.params.registry, &self.params.resource_group)
                    .await?;
                let credential = az.create_service_principal(identity, &scope).await?;
                info!(identity = %identity, "created service principal with acrpull role");
                (credential, CredentialOutcome::Created)
            }
        };

        let Tagged {
            login_server,
            image,
        } = self.state;
        Ok(Provision {
            params: self.params,
            state: CredentialReady {
                login_server,
                image,
                credential,
                outcome,
            },
        })
    }
}

// =============================================================================
// CredentialReady -> Published
// =============================================================================

impl Provision<CredentialReady> {
    /// Push the tagged image to the registry.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Engine` carrying the engine's stderr if the
    /// push fails.
    #[must_use = "provisioning state must be used"]
    pub async fn push<E: CommandRunner>(
        self,
        engine: &EngineCli<E>,
    ) -> Result<Provision<Published>, ProvisionError> {
        engine.push(&self.state.image).await?;

        let CredentialReady {
            login_server,
            image,
            credential,
            outcome,
        } = self.state;
        Ok(Provision {
            params: self.params,
            state: Published {
                login_server,
                image,
                credential,
                outcome,
            },
        })
    }
}

// =============================================================================
// Published -> Deployed
// =============================================================================

impl Provision<Published> {
    /// Create the container instance.
    ///
    /// Deploy is deliberately create-if-absent: the underlying create has
    /// no defined semantics for an existing name, so a taken name fails
    /// loudly with `ContainerNameTaken` instead of inheriting provider
    /// behavior.
    ///
    /// When the credential was created in this run, the create is retried
    /// a bounded number of times with a fixed backoff while the role
    /// assignment propagates through the directory. A rotated credential
    /// gets no retry.
    ///
    /// # Errors
    ///
    /// Returns `ContainerNameTaken` if the name is in use, or
    /// `ProvisionError::Cloud` once the retry budget is spent.
    #[must_use = "provisioning state must be used"]
    pub async fn deploy<R: CommandRunner>(
        self,
        az: &AzureCli<R>,
    ) -> Result<Provision<Deployed>, ProvisionError> {
        let name = &self.params.container;
        let group = &self.params.resource_group;

        match az.show_container(name, group).await {
            Ok(()) => {
                return Err(ProvisionError::ContainerNameTaken(name.clone()));
            }
            Err(CloudError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let request = ContainerRequest {
            resource_group: group,
            name,
            image: &self.state.image,
            cpu: self.params.cpu,
            memory_gb: self.params.memory_gb,
            login_server: &self.state.login_server,
            credential: &self.state.credential,
            dns_label: &self.params.dns_label,
            ports: &self.params.ports,
        };

        let attempts = match self.state.outcome {
            CredentialOutcome::Created => self.params.propagation.attempts,
            CredentialOutcome::Rotated => 1,
        };
        let backoff = self.params.propagation.backoff;

        let mut attempt = 1;
        loop {
            match az.create_container(&request).await {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!(
                        error = %e,
                        attempt,
                        "container create failed; waiting for role assignment to propagate"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(container = %name, "created container instance");

        Ok(self.transition(Deployed))
    }
}

// =============================================================================
// Deployed -> Completed
// =============================================================================

impl Provision<Deployed> {
    /// Look up the FQDN the provider assigned and form the public
    /// endpoint from it and the first configured port.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Cloud` if the lookup fails or returns
    /// nothing.
    #[must_use = "provisioning state must be used"]
    pub async fn resolve_endpoint<R: CommandRunner>(
        self,
        az: &AzureCli<R>,
    ) -> Result<Provision<Completed>, ProvisionError> {
        let fqdn = az
            .container_fqdn(&self.params.container, &self.params.resource_group)
            .await?;
        let endpoint = Endpoint::new(fqdn, *self.params.ports.first());

        Ok(self.transition(Completed { endpoint }))
    }
}
