pub mod agent;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod knowledge_base;
pub mod log_retention;
pub mod logging;
pub mod model;
pub mod recorder;
pub mod report;
pub mod runtime;
pub mod types;

use agent::IncidentAgent;
use clap::{error::ErrorKind, Parser, ValueEnum};
use classifier::Classifier;
use config::{load_config, resolve_api_key, CliOverrides, EnvMap};
use errors::IncidentError;
use ingest::load_logs;
use knowledge_base::KnowledgeBase;
use logging::{append_run_log, init_run_log, JsonlLogger};
use model::factory::AdapterFactory;
use model::AdapterContext;
use report::render_report;
use runtime::ProductionRuntime;
use serde_json::json;
use types::ServiceKind;

#[derive(Debug, Clone, Parser)]
#[command(name = "incident-agent")]
#[command(about = "Classify IT log lines with a hosted model and suggest remediations")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    /// Newline-delimited log file; the built-in sample logs are used when omitted.
    #[arg(long)]
    pub logs: Option<std::path::PathBuf>,
    #[arg(long, value_enum)]
    pub backend: Option<CliBackend>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Categories with more logs than this get a standing recommendation.
    #[arg(long)]
    pub threshold: Option<usize>,
    #[arg(long)]
    pub run_log: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliBackend {
    Granite,
    Inference,
    Structured,
}

impl From<CliBackend> for ServiceKind {
    fn from(value: CliBackend) -> Self {
        match value {
            CliBackend::Granite => ServiceKind::Granite,
            CliBackend::Inference => ServiceKind::Inference,
            CliBackend::Structured => ServiceKind::Structured,
        }
    }
}

pub fn run() -> Result<i32, IncidentError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let env = std::env::vars_os().collect::<Vec<_>>();
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &env, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    env: &[(std::ffi::OsString, std::ffi::OsString)],
    runtime: &ProductionRuntime,
) -> Result<i32, IncidentError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(IncidentError::Cli(error.to_string())),
        },
    };

    let env_map = env_to_map(env);
    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        backend: cli.backend.map(Into::into),
        model: cli.model.clone(),
        endpoint: cli.endpoint.clone(),
        threshold: cli.threshold,
        run_log: cli.run_log.clone(),
    };
    let cfg = load_config(&overrides, &env_map, runtime.file_system.as_ref())?;

    if let Some(path) = &cfg.logging.path {
        let mut logger = JsonlLogger::new(path);
        logger.max_payload_bytes = cfg.logging.max_payload_bytes;
        init_run_log(logger);
    }

    let knowledge_base = KnowledgeBase::from_config(&cfg.knowledge_base)?;
    let logs = load_logs(runtime.file_system.as_ref(), cli.logs.as_deref())?;

    let factory = AdapterFactory::with_defaults();
    let adapter = factory.get(cfg.service.backend).ok_or_else(|| {
        IncidentError::InvalidConfig(format!(
            "no adapter registered for backend {}",
            cfg.service.backend.as_str()
        ))
    })?;
    let context = AdapterContext::from_config(&cfg, resolve_api_key(&cfg, &env_map));
    let classifier = Classifier::new(adapter, runtime.http_client.clone(), context);

    append_run_log(
        "info",
        "run.start",
        json!({
            "backend": cfg.service.backend.as_str(),
            "model_id": cfg.service.model_id,
            "logs": logs.len(),
            "knowledge_base_entries": knowledge_base.len(),
        }),
    );

    let mut agent = IncidentAgent::new(classifier, knowledge_base, cfg.report.recurring_threshold);
    agent.parse_logs(&logs);

    let report = render_report(&agent.diagnose(), &agent.recommend())?;
    runtime.terminal.write_line(&report)?;
    Ok(0)
}

fn env_to_map(env: &[(std::ffi::OsString, std::ffi::OsString)]) -> EnvMap {
    let mut map = EnvMap::new();
    for (key, value) in env {
        if let (Some(key), Some(value)) = (key.to_str(), value.to_str()) {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}
