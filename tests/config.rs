// ABOUTME: Integration tests for configuration parsing and resolution.
// ABOUTME: Tests YAML parsing, env interpolation, defaults, and validation.

use gantry::config::*;
use gantry::error::Error;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
"#;
        let params = Config::from_yaml(yaml).unwrap().resolve().unwrap();
        assert_eq!(params.resource_group, "rg1");
        assert_eq!(params.location, "eastus");
        assert_eq!(params.registry_sku, RegistrySku::Standard);
        assert_eq!(params.container, "gantry-app");
        assert_eq!(params.ports.len(), 1);
        assert_eq!(*params.ports.first(), 80);
        assert_eq!(params.cpu, 1.0);
        assert_eq!(params.memory_gb, 1.5);
        assert_eq!(params.propagation.attempts, 3);
        assert_eq!(params.propagation.backoff, Duration::from_secs(10));
    }

    #[test]
    fn full_config_overrides_everything() {
        let yaml = r#"
resource_group: rg-prod
location: westeurope
registry: prodacr
registry_sku: Premium
image: shop/web:2.1.0
identity: shop-puller
container: shop-web
dns_label: shop-prod
ports:
  - 8080
  - 8443
resources:
  cpu: 2.0
  memory_gb: 3.5
propagation:
  attempts: 5
  backoff: 30s
"#;
        let params = Config::from_yaml(yaml).unwrap().resolve().unwrap();
        assert_eq!(params.location, "westeurope");
        assert_eq!(params.registry_sku, RegistrySku::Premium);
        assert_eq!(params.image.name(), "shop/web");
        assert_eq!(params.image.tag(), "2.1.0");
        assert_eq!(params.dns_label.as_str(), "shop-prod");
        assert_eq!(params.ports.len(), 2);
        assert_eq!(params.cpu, 2.0);
        assert_eq!(params.memory_gb, 3.5);
        assert_eq!(params.propagation.attempts, 5);
        assert_eq!(params.propagation.backoff, Duration::from_secs(30));
    }

    #[test]
    fn empty_port_list_is_rejected_at_parse_time() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
ports: []
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("at least one port"));
    }
}

mod resolution {
    use super::*;

    fn env_config() -> Config {
        let yaml = r#"
resource_group: rg1
registry:
  env: GANTRY_TEST_REGISTRY
image:
  env: GANTRY_TEST_IMAGE
  default: fallback-app:v1
identity: sp1
"#;
        Config::from_yaml(yaml).unwrap()
    }

    #[test]
    fn env_references_resolve_from_the_environment() {
        temp_env::with_var("GANTRY_TEST_REGISTRY", Some("envacr"), || {
            let params = env_config().resolve().unwrap();
            assert_eq!(params.registry, "envacr");
        });
    }

    #[test]
    fn env_reference_falls_back_to_default() {
        temp_env::with_vars(
            [
                ("GANTRY_TEST_REGISTRY", Some("envacr")),
                ("GANTRY_TEST_IMAGE", None),
            ],
            || {
                let params = env_config().resolve().unwrap();
                assert_eq!(params.image.name(), "fallback-app");
                assert_eq!(params.image.tag(), "v1");
            },
        );
    }

    #[test]
    fn missing_env_var_without_default_is_an_error() {
        temp_env::with_var_unset("GANTRY_TEST_REGISTRY", || {
            let err = env_config().resolve().unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "GANTRY_TEST_REGISTRY"));
        });
    }

    #[test]
    fn empty_resolved_value_is_invalid() {
        let yaml = r#"
resource_group: ""
registry: acr1
image: app:v1
identity: sp1
"#;
        let err = Config::from_yaml(yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("resource_group")));
    }

    #[test]
    fn dns_label_defaults_to_container_and_pid() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
container: web
"#;
        let params = Config::from_yaml(yaml).unwrap().resolve().unwrap();
        assert!(params.dns_label.as_str().starts_with("web-"));
    }

    #[test]
    fn invalid_dns_label_is_rejected() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
dns_label: MyApp
"#;
        let err = Config::from_yaml(yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("dns_label")));
    }

    #[test]
    fn zero_cpu_is_rejected() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
resources:
  cpu: 0.0
"#;
        let err = Config::from_yaml(yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("cpu")));
    }

    #[test]
    fn zero_propagation_attempts_is_rejected() {
        let yaml = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
propagation:
  attempts: 0
"#;
        let err = Config::from_yaml(yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("attempts")));
    }
}

mod discovery {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
"#;

    #[test]
    fn finds_gantry_yml_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gantry.yml"), MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.resolve().unwrap().registry, "acr1");
    }

    #[test]
    fn falls_back_to_dot_gantry_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".gantry")).unwrap();
        fs::write(dir.path().join(".gantry/config.yml"), MINIMAL).unwrap();

        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}

mod init {
    use super::*;
    use std::fs;

    #[test]
    fn writes_a_loadable_template() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();

        let err = init_config(dir.path(), None, None, false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        init_config(dir.path(), Some("otheracr"), None, true).unwrap();
        let content = fs::read_to_string(dir.path().join("gantry.yml")).unwrap();
        assert!(content.contains("otheracr"));
    }

    #[test]
    fn rejects_an_invalid_image_override() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_config(dir.path(), None, Some("bad image!"), false).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
