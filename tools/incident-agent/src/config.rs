use crate::errors::IncidentError;
use crate::knowledge_base::KnowledgeBase;
use crate::report::DEFAULT_RECURRING_THRESHOLD;
use crate::runtime::FileSystem;
use crate::types::{Category, ServiceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub type EnvMap = BTreeMap<String, String>;

pub const ENDPOINT_ENV: &str = "INCIDENT_AGENT_ENDPOINT";

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub backend: Option<ServiceKind>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub threshold: Option<usize>,
    pub run_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub generation: GenerationConfig,
    pub report: ReportConfig,
    pub knowledge_base: BTreeMap<String, String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    pub backend: ServiceKind,
    pub endpoint: String,
    pub model_id: String,
    pub project_id: Option<String>,
    pub api_version: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub category_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    pub decoding_method: String,
    pub max_new_tokens: u32,
    pub prompt_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    pub recurring_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                backend: ServiceKind::Granite,
                endpoint: "https://us-south.ml.cloud.ibm.com".to_string(),
                model_id: "ibm/granite-13b-instruct-v2".to_string(),
                project_id: None,
                api_version: "2023-05-29".to_string(),
                api_key_env: "IBM_GRANITE_API_KEY".to_string(),
                timeout_secs: 30,
                category_field: "category".to_string(),
            },
            generation: GenerationConfig {
                decoding_method: "greedy".to_string(),
                max_new_tokens: 50,
                prompt_prefix: "Classify this log: ".to_string(),
            },
            report: ReportConfig {
                recurring_threshold: DEFAULT_RECURRING_THRESHOLD,
            },
            knowledge_base: default_knowledge_base(),
            logging: LoggingConfig {
                path: None,
                max_payload_bytes: crate::logging::DEFAULT_MAX_PAYLOAD_BYTES,
            },
        }
    }
}

fn default_knowledge_base() -> BTreeMap<String, String> {
    [
        (Category::Critical, "Restart the server and check system logs."),
        (
            Category::High,
            "Optimize database queries and scale infrastructure.",
        ),
        (Category::Medium, "Analyze memory usage and fix memory leaks."),
    ]
    .into_iter()
    .map(|(category, solution)| (category.as_str().to_string(), solution.to_string()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    service: Option<PartialServiceConfig>,
    generation: Option<PartialGenerationConfig>,
    report: Option<PartialReportConfig>,
    knowledge_base: Option<BTreeMap<String, String>>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialServiceConfig {
    backend: Option<ServiceKind>,
    endpoint: Option<String>,
    model_id: Option<String>,
    project_id: Option<String>,
    api_version: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
    category_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialGenerationConfig {
    decoding_method: Option<String>,
    max_new_tokens: Option<u32>,
    prompt_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialReportConfig {
    recurring_threshold: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

pub fn load_config(
    overrides: &CliOverrides,
    env: &EnvMap,
    fs: &dyn FileSystem,
) -> Result<AppConfig, IncidentError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| IncidentError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_env_overrides(&mut cfg, env);
    apply_cli_overrides(&mut cfg, overrides);

    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(service) = partial.service {
        if let Some(value) = service.backend {
            cfg.service.backend = value;
        }
        if let Some(value) = service.endpoint {
            cfg.service.endpoint = value;
        }
        if let Some(value) = service.model_id {
            cfg.service.model_id = value;
        }
        if let Some(value) = service.project_id {
            cfg.service.project_id = Some(value);
        }
        if let Some(value) = service.api_version {
            cfg.service.api_version = value;
        }
        if let Some(value) = service.api_key_env {
            cfg.service.api_key_env = value;
        }
        if let Some(value) = service.timeout_secs {
            cfg.service.timeout_secs = value;
        }
        if let Some(value) = service.category_field {
            cfg.service.category_field = value;
        }
    }

    if let Some(generation) = partial.generation {
        if let Some(value) = generation.decoding_method {
            cfg.generation.decoding_method = value;
        }
        if let Some(value) = generation.max_new_tokens {
            cfg.generation.max_new_tokens = value;
        }
        if let Some(value) = generation.prompt_prefix {
            cfg.generation.prompt_prefix = value;
        }
    }

    if let Some(report) = partial.report {
        if let Some(value) = report.recurring_threshold {
            cfg.report.recurring_threshold = value;
        }
    }

    // A knowledge_base table replaces the defaults wholesale.
    if let Some(knowledge_base) = partial.knowledge_base {
        cfg.knowledge_base = knowledge_base;
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.path {
            cfg.logging.path = Some(value);
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }
}

fn apply_env_overrides(cfg: &mut AppConfig, env: &EnvMap) {
    if let Some(endpoint) = env.get(ENDPOINT_ENV) {
        if !endpoint.trim().is_empty() {
            cfg.service.endpoint = endpoint.trim().to_string();
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(backend) = overrides.backend {
        cfg.service.backend = backend;
    }
    if let Some(model) = &overrides.model {
        cfg.service.model_id = model.clone();
    }
    if let Some(endpoint) = &overrides.endpoint {
        cfg.service.endpoint = endpoint.clone();
    }
    if let Some(threshold) = overrides.threshold {
        cfg.report.recurring_threshold = threshold;
    }
    if let Some(path) = &overrides.run_log {
        cfg.logging.path = Some(path.clone());
    }
}

/// Reads the API key from the environment variable named in `service.api_key_env`.
pub fn resolve_api_key(cfg: &AppConfig, env: &EnvMap) -> Option<String> {
    env.get(&cfg.service.api_key_env)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate_config(cfg: &AppConfig) -> Result<(), IncidentError> {
    if cfg.service.endpoint.trim().is_empty() {
        return Err(IncidentError::InvalidConfig(
            "service.endpoint must not be empty".to_string(),
        ));
    }

    validate_model(&cfg.service.model_id)?;

    if cfg.generation.max_new_tokens == 0 {
        return Err(IncidentError::InvalidConfig(
            "generation.max_new_tokens must be greater than zero".to_string(),
        ));
    }

    if cfg.service.backend == ServiceKind::Structured
        && cfg.service.category_field.trim().is_empty()
    {
        return Err(IncidentError::InvalidConfig(
            "service.category_field is required for the structured backend".to_string(),
        ));
    }

    KnowledgeBase::from_config(&cfg.knowledge_base)?;

    Ok(())
}

pub fn validate_model(model: &str) -> Result<(), IncidentError> {
    if model.trim().is_empty() || model.trim() == "..." || model.eq_ignore_ascii_case("todo") {
        return Err(IncidentError::InvalidConfig(
            "service.model_id must be a real model id".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_config, resolve_api_key, validate_model, CliOverrides, EnvMap, ENDPOINT_ENV};
    use crate::runtime::FakeFileSystem;
    use crate::types::ServiceKind;
    use std::path::PathBuf;

    fn overrides_for(path: &str) -> CliOverrides {
        CliOverrides {
            config_path: Some(PathBuf::from(path)),
            ..CliOverrides::default()
        }
    }

    #[test]
    fn defaults_load_without_a_file() {
        let fs = FakeFileSystem::default();
        let cfg = load_config(&CliOverrides::default(), &EnvMap::new(), &fs).expect("cfg");
        assert_eq!(cfg.service.backend, ServiceKind::Granite);
        assert_eq!(cfg.generation.max_new_tokens, 50);
        assert_eq!(cfg.report.recurring_threshold, 3);
        assert_eq!(cfg.knowledge_base.len(), 3);
        assert!(cfg.logging.path.is_none());
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let fs = FakeFileSystem::with_file(
            "/agent.toml",
            "[service]\nbackend = \"structured\"\n\n[report]\nrecurring_threshold = 5\n",
        );
        let cfg = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs).expect("cfg");
        assert_eq!(cfg.service.backend, ServiceKind::Structured);
        assert_eq!(cfg.report.recurring_threshold, 5);
        assert_eq!(cfg.generation.decoding_method, "greedy");
    }

    #[test]
    fn knowledge_base_table_replaces_defaults() {
        let fs = FakeFileSystem::with_file(
            "/agent.toml",
            "[knowledge_base]\nCritical = \"Page the on-call engineer.\"\n",
        );
        let cfg = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs).expect("cfg");
        assert_eq!(cfg.knowledge_base.len(), 1);
        assert_eq!(
            cfg.knowledge_base.get("Critical").map(String::as_str),
            Some("Page the on-call engineer.")
        );
    }

    #[test]
    fn unknown_knowledge_base_category_is_rejected() {
        let fs = FakeFileSystem::with_file("/agent.toml", "[knowledge_base]\nSevere = \"x\"\n");
        let err = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs)
            .expect_err("invalid");
        assert!(format!("{err}").contains("Severe"));
    }

    #[test]
    fn duplicate_knowledge_base_category_is_rejected() {
        let fs = FakeFileSystem::with_file(
            "/agent.toml",
            "[knowledge_base]\nHigh = \"scale out\"\nhigh = \"page someone\"\n",
        );
        let err = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs)
            .expect_err("duplicate");
        assert!(format!("{err}").contains("more than once"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let fs = FakeFileSystem::with_file("/agent.toml", "[service\nendpoint = ");
        let err = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs)
            .expect_err("invalid");
        assert!(format!("{err}").contains("config parse error"));
    }

    #[test]
    fn cli_overrides_win_over_env_and_file() {
        let fs = FakeFileSystem::with_file(
            "/agent.toml",
            "[service]\nendpoint = \"http://file\"\nmodel_id = \"file-model\"\n",
        );
        let mut env = EnvMap::new();
        env.insert(ENDPOINT_ENV.to_string(), "http://env".to_string());

        let from_env = load_config(&overrides_for("/agent.toml"), &env, &fs).expect("cfg");
        assert_eq!(from_env.service.endpoint, "http://env");
        assert_eq!(from_env.service.model_id, "file-model");

        let overrides = CliOverrides {
            endpoint: Some("http://cli".to_string()),
            threshold: Some(1),
            ..overrides_for("/agent.toml")
        };
        let from_cli = load_config(&overrides, &env, &fs).expect("cfg");
        assert_eq!(from_cli.service.endpoint, "http://cli");
        assert_eq!(from_cli.report.recurring_threshold, 1);
    }

    #[test]
    fn zero_token_budget_is_rejected() {
        let fs = FakeFileSystem::with_file("/agent.toml", "[generation]\nmax_new_tokens = 0\n");
        let err = load_config(&overrides_for("/agent.toml"), &EnvMap::new(), &fs)
            .expect_err("invalid");
        assert!(format!("{err}").contains("max_new_tokens"));
    }

    #[test]
    fn api_key_is_read_from_named_variable() {
        let fs = FakeFileSystem::default();
        let cfg = load_config(&CliOverrides::default(), &EnvMap::new(), &fs).expect("cfg");
        let mut env = EnvMap::new();
        assert_eq!(resolve_api_key(&cfg, &env), None);
        env.insert("IBM_GRANITE_API_KEY".to_string(), " secret ".to_string());
        assert_eq!(resolve_api_key(&cfg, &env).as_deref(), Some("secret"));
    }

    #[test]
    fn validate_model_rejects_placeholders() {
        for value in ["", "...", "todo", "TODO"] {
            let err = validate_model(value).expect_err("invalid");
            assert!(format!("{err}").contains("model_id"));
        }
        validate_model("ibm/granite-13b-instruct-v2").expect("valid");
    }
}
