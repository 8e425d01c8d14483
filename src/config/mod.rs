// ABOUTME: Configuration types and parsing for gantry.yml.
// ABOUTME: Handles YAML parsing, env interpolation, and resolution into Params.

mod env_value;

pub use env_value::EnvValue;

use crate::error::{Error, Result};
use crate::types::{DnsLabel, ImageRef};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "gantry.yml";
pub const CONFIG_FILENAME_ALT: &str = "gantry.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".gantry/config.yml";

/// Raw configuration as written in gantry.yml. Scalar fields accept either
/// a literal or an `{env: VAR, default: ...}` reference; [`Config::resolve`]
/// turns the whole thing into a validated [`Params`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub resource_group: EnvValue,

    #[serde(default = "default_location")]
    pub location: EnvValue,

    pub registry: EnvValue,

    #[serde(default)]
    pub registry_sku: RegistrySku,

    pub image: EnvValue,

    /// Display name of the pull-only service principal.
    pub identity: EnvValue,

    #[serde(default = "default_container")]
    pub container: EnvValue,

    /// Defaults to `{container}-{pid}` when unset.
    #[serde(default)]
    pub dns_label: Option<EnvValue>,

    #[serde(default = "default_ports", deserialize_with = "deserialize_ports")]
    pub ports: NonEmpty<u16>,

    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub propagation: PropagationConfig,
}

/// ACR pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum RegistrySku {
    Basic,
    #[default]
    Standard,
    Premium,
}

impl RegistrySku {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrySku::Basic => "Basic",
            RegistrySku::Standard => "Standard",
            RegistrySku::Premium => "Premium",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default = "default_cpu")]
    pub cpu: f64,
    #[serde(default = "default_memory_gb")]
    pub memory_gb: f64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory_gb: default_memory_gb(),
        }
    }
}

/// Bounded retry applied to the first credential-consuming operation after
/// a service principal is created, while the role assignment propagates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PropagationConfig {
    #[serde(default = "default_propagation_attempts")]
    pub attempts: u32,
    #[serde(default = "default_propagation_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            attempts: default_propagation_attempts(),
            backoff: default_propagation_backoff(),
        }
    }
}

fn default_location() -> EnvValue {
    EnvValue::literal("eastus")
}

fn default_container() -> EnvValue {
    EnvValue::literal("gantry-app")
}

fn default_ports() -> NonEmpty<u16> {
    NonEmpty::new(80)
}

fn default_cpu() -> f64 {
    1.0
}

fn default_memory_gb() -> f64 {
    1.5
}

fn default_propagation_attempts() -> u32 {
    3
}

fn default_propagation_backoff() -> Duration {
    Duration::from_secs(10)
}

/// Fully resolved, validated parameter set for one run. Immutable; owned by
/// the provisioning state machine and borrowed by every step.
#[derive(Debug, Clone)]
pub struct Params {
    pub resource_group: String,
    pub location: String,
    pub registry: String,
    pub registry_sku: RegistrySku,
    pub image: ImageRef,
    pub identity: String,
    pub container: String,
    pub dns_label: DnsLabel,
    pub ports: NonEmpty<u16>,
    pub cpu: f64,
    pub memory_gb: f64,
    pub propagation: PropagationConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolve env references and validate every field. All parameters
    /// must come out non-empty before orchestration starts.
    pub fn resolve(&self) -> Result<Params> {
        let resource_group = require(&self.resource_group, "resource_group")?;
        let location = require(&self.location, "location")?;
        let registry = require(&self.registry, "registry")?;
        let identity = require(&self.identity, "identity")?;
        let container = require(&self.container, "container")?;

        let image = ImageRef::parse(&require(&self.image, "image")?)
            .map_err(|e| Error::InvalidConfig(format!("image: {e}")))?;

        let dns_label = match &self.dns_label {
            Some(value) => require(value, "dns_label")?,
            None => format!("{}-{}", container, std::process::id()),
        };
        let dns_label =
            DnsLabel::new(&dns_label).map_err(|e| Error::InvalidConfig(format!("dns_label: {e}")))?;

        if self.resources.cpu <= 0.0 {
            return Err(Error::InvalidConfig(
                "resources.cpu must be positive".to_string(),
            ));
        }
        if self.resources.memory_gb <= 0.0 {
            return Err(Error::InvalidConfig(
                "resources.memory_gb must be positive".to_string(),
            ));
        }
        if self.propagation.attempts == 0 {
            return Err(Error::InvalidConfig(
                "propagation.attempts must be at least 1".to_string(),
            ));
        }

        Ok(Params {
            resource_group,
            location,
            registry,
            registry_sku: self.registry_sku,
            image,
            identity,
            container,
            dns_label,
            ports: self.ports.clone(),
            cpu: self.resources.cpu,
            memory_gb: self.resources.memory_gb,
            propagation: self.propagation,
        })
    }

    pub fn template() -> Self {
        Config {
            resource_group: EnvValue::literal("my-app-rg"),
            location: default_location(),
            registry: EnvValue::literal("myappacr"),
            registry_sku: RegistrySku::default(),
            image: EnvValue::literal("my-app:latest"),
            identity: EnvValue::literal("my-app-puller"),
            container: EnvValue::literal("my-app"),
            dns_label: None,
            ports: default_ports(),
            resources: ResourcesConfig::default(),
            propagation: PropagationConfig::default(),
        }
    }
}

pub fn init_config(
    dir: &Path,
    registry: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(r) = registry {
        config.registry = EnvValue::literal(r);
    }

    if let Some(i) = image {
        ImageRef::parse(i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.image = EnvValue::literal(i);
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    // Template values are all literals; resolution cannot fail here.
    let lit = |v: &EnvValue| v.resolve().unwrap_or_default();
    format!(
        r#"resource_group: {}
location: {}
registry: {}
image: {}
identity: {}
container: {}
ports:
  - {}
"#,
        lit(&config.resource_group),
        lit(&config.location),
        lit(&config.registry),
        lit(&config.image),
        lit(&config.identity),
        lit(&config.container),
        config.ports.first()
    )
}

fn require(value: &EnvValue, field: &'static str) -> Result<String> {
    let resolved = value.resolve()?;
    if resolved.trim().is_empty() {
        return Err(Error::InvalidConfig(format!("{field} must not be empty")));
    }
    Ok(resolved)
}

fn deserialize_ports<'de, D>(deserializer: D) -> std::result::Result<NonEmpty<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<u16> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one port is required"))
}
