// ABOUTME: Typed wrapper over the Azure CLI.
// ABOUTME: One method per az invocation; builds argv and parses tsv/json output.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::fmt;

use crate::exec::{CommandOutput, CommandRunner, Invocation};
use crate::types::{DnsLabel, ImageRef, PrincipalId, ResourceId};

use super::error::{classify_create, classify_probe, CloudError};

const AZ: &str = "az";

/// Credential a container instance presents to pull from the registry.
///
/// The secret exists only in process memory for the duration of one run;
/// it is never written to durable storage.
#[derive(Clone)]
pub struct RegistryCredential {
    pub app_id: PrincipalId,
    pub secret: String,
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("app_id", &self.app_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Everything `az container create` needs for one instance.
#[derive(Debug)]
pub struct ContainerRequest<'a> {
    pub resource_group: &'a str,
    pub name: &'a str,
    pub image: &'a ImageRef,
    pub cpu: f64,
    pub memory_gb: f64,
    pub login_server: &'a str,
    pub credential: &'a RegistryCredential,
    pub dns_label: &'a DnsLabel,
    pub ports: &'a NonEmpty<u16>,
}

/// Typed surface over the `az` CLI, generic over the command runner so
/// tests can script responses.
#[derive(Debug)]
pub struct AzureCli<R> {
    runner: R,
}

/// Payload of `az ad sp create-for-rbac --output json`. Extra fields
/// (displayName, tenant) are ignored.
#[derive(Deserialize)]
struct RbacCredential {
    #[serde(rename = "appId")]
    app_id: PrincipalId,
    password: String,
}

impl<R: CommandRunner> AzureCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// `az group exists`, the dedicated existence predicate for resource
    /// groups.
    pub async fn group_exists(&self, name: &str) -> Result<bool, CloudError> {
        let out = self
            .run(&["group", "exists", "--name", name, "--output", "tsv"])
            .await?;
        match out.stdout_trimmed() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(CloudError::Parse {
                operation: "group exists",
                message: format!("expected true or false, got {other:?}"),
            }),
        }
    }

    /// Create a resource group. A conflict from the create call is
    /// reported as `AlreadyExists` so callers can treat a lost
    /// check-then-act race as success.
    pub async fn create_group(&self, name: &str, location: &str) -> Result<(), CloudError> {
        self.run(&["group", "create", "--name", name, "--location", location])
            .await
            .map_err(|e| classify_create(e, &format!("resource group {name}")))?;
        Ok(())
    }

    /// Probe the registry. There is no boolean existence query for ACR;
    /// absence is a `NotFound` failure of the probe itself.
    pub async fn show_registry(&self, name: &str, resource_group: &str) -> Result<(), CloudError> {
        self.run(&[
            "acr",
            "show",
            "--name",
            name,
            "--resource-group",
            resource_group,
        ])
        .await
        .map_err(|e| classify_probe(e, &format!("registry {name}")))?;
        Ok(())
    }

    pub async fn create_registry(
        &self,
        name: &str,
        resource_group: &str,
        sku: &str,
    ) -> Result<(), CloudError> {
        self.run(&[
            "acr",
            "create",
            "--name",
            name,
            "--resource-group",
            resource_group,
            "--sku",
            sku,
        ])
        .await
        .map_err(|e| classify_create(e, &format!("registry {name}")))?;
        Ok(())
    }

    /// The registry's public address, e.g. `myacr.azurecr.io`.
    pub async fn registry_login_server(&self, name: &str) -> Result<String, CloudError> {
        let out = self
            .run(&[
                "acr",
                "show",
                "--name",
                name,
                "--query",
                "loginServer",
                "--output",
                "tsv",
            ])
            .await?;
        require_line(&out, "acr show --query loginServer")
    }

    /// The registry's ARM resource id, used as the role assignment scope.
    pub async fn registry_id(
        &self,
        name: &str,
        resource_group: &str,
    ) -> Result<ResourceId, CloudError> {
        let out = self
            .run(&[
                "acr",
                "show",
                "--name",
                name,
                "--resource-group",
                resource_group,
                "--query",
                "id",
                "--output",
                "tsv",
            ])
            .await?;
        require_line(&out, "acr show --query id").map(ResourceId::new)
    }

    /// Look up a service principal by display name. Empty output means
    /// absent. Display names are not unique in the directory; the first
    /// match wins, as with the interactive CLI.
    pub async fn find_service_principal(
        &self,
        display_name: &str,
    ) -> Result<Option<PrincipalId>, CloudError> {
        let out = self
            .run(&[
                "ad",
                "sp",
                "list",
                "--display-name",
                display_name,
                "--query",
                "[].appId",
                "--output",
                "tsv",
            ])
            .await?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| PrincipalId::new(l.to_string())))
    }

    /// Create a service principal with pull-only access to the registry,
    /// returning the generated credential.
    pub async fn create_service_principal(
        &self,
        display_name: &str,
        scope: &ResourceId,
    ) -> Result<RegistryCredential, CloudError> {
        let out = self
            .run(&[
                "ad",
                "sp",
                "create-for-rbac",
                "--name",
                display_name,
                "--scopes",
                scope.as_str(),
                "--role",
                "acrpull",
                "--output",
                "json",
            ])
            .await?;
        let parsed: RbacCredential =
            serde_json::from_str(&out.stdout).map_err(|e| CloudError::Parse {
                operation: "ad sp create-for-rbac",
                message: e.to_string(),
            })?;
        Ok(RegistryCredential {
            app_id: parsed.app_id,
            secret: parsed.password,
        })
    }

    /// Mint a fresh secret for an existing principal. The appId is
    /// unchanged.
    pub async fn reset_credential(&self, app_id: &PrincipalId) -> Result<String, CloudError> {
        let out = self
            .run(&[
                "ad",
                "sp",
                "credential",
                "reset",
                "--id",
                app_id.as_str(),
                "--query",
                "[0].password",
                "--output",
                "tsv",
            ])
            .await?;
        require_line(&out, "ad sp credential reset")
    }

    /// Probe for an existing container instance with the given name.
    pub async fn show_container(&self, name: &str, resource_group: &str) -> Result<(), CloudError> {
        self.run(&[
            "container",
            "show",
            "--resource-group",
            resource_group,
            "--name",
            name,
        ])
        .await
        .map_err(|e| classify_probe(e, &format!("container {name}")))?;
        Ok(())
    }

    /// Create the container instance: image, limits, pull credential,
    /// public IP, DNS label, ports, all in one request.
    pub async fn create_container(&self, req: &ContainerRequest<'_>) -> Result<(), CloudError> {
        let image = req.image.to_string();
        let cpu = req.cpu.to_string();
        let memory = req.memory_gb.to_string();
        let ports: Vec<String> = req.ports.iter().map(u16::to_string).collect();

        let mut args: Vec<&str> = vec![
            "container",
            "create",
            "--resource-group",
            req.resource_group,
            "--name",
            req.name,
            "--image",
            &image,
            "--cpu",
            &cpu,
            "--memory",
            &memory,
            "--registry-login-server",
            req.login_server,
            "--registry-username",
            req.credential.app_id.as_str(),
            "--registry-password",
            &req.credential.secret,
            "--ip-address",
            "Public",
            "--dns-name-label",
            req.dns_label.as_str(),
            "--ports",
        ];
        args.extend(ports.iter().map(String::as_str));

        self.run(&args).await?;
        Ok(())
    }

    /// The FQDN assigned to a deployed container instance. Only meaningful
    /// after a successful create.
    pub async fn container_fqdn(
        &self,
        name: &str,
        resource_group: &str,
    ) -> Result<String, CloudError> {
        let out = self
            .run(&[
                "container",
                "show",
                "--resource-group",
                resource_group,
                "--name",
                name,
                "--query",
                "ipAddress.fqdn",
                "--output",
                "tsv",
            ])
            .await?;
        require_line(&out, "container show --query ipAddress.fqdn")
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput, crate::exec::ExecError> {
        let invocation = Invocation::new(AZ, args.iter().map(|a| a.to_string()));
        self.runner.run(&invocation).await
    }
}

/// First non-empty line of a tsv response, or a parse error.
fn require_line(out: &CommandOutput, operation: &'static str) -> Result<String, CloudError> {
    out.stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or(CloudError::Parse {
            operation,
            message: "empty response".to_string(),
        })
}
