//! Configuration for the executioner.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (credentials, model, bind address)
//! 2. Config file (.executioner/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .executioner/config.yaml
//! - Falls back to ~/.executioner/config.yaml
//!
//! Configuration is read once at process start; there is no hot reload.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{drive, github, gmail, GoogleCredentials};
use crate::core::{AgentSettings, DEFAULT_EXCERPT_CHARS};
use crate::error::PipelineError;
use crate::llm::DEFAULT_BASE_URL;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".executioner";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub version: Option<String>,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub classifier: Option<ClassifierConfig>,
    #[serde(default)]
    pub execution: Option<ExecutionConfig>,
    #[serde(default)]
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    /// Per-source scan timeout
    pub scan_timeout_seconds: Option<u64>,
    pub drive: Option<SourceSection>,
    pub gmail: Option<SourceSection>,
    pub github: Option<SourceSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSection {
    pub enabled: Option<bool>,
    pub query: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub excerpt_chars: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    /// Pause between consecutive batch tasks
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Language model provider settings
#[derive(Clone, Serialize)]
pub struct OpenAiSettings {
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// What to ask one source for
#[derive(Debug, Clone, Serialize)]
pub struct SourceSettings {
    pub enabled: bool,
    pub query: String,
    pub limit: usize,
}

impl SourceSettings {
    fn resolve(section: Option<&SourceSection>, default_query: &str, default_limit: usize) -> Self {
        Self {
            enabled: section.and_then(|s| s.enabled).unwrap_or(true),
            query: section
                .and_then(|s| s.query.clone())
                .unwrap_or_else(|| default_query.to_string()),
            limit: section.and_then(|s| s.limit).unwrap_or(default_limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSet {
    pub drive: SourceSettings,
    pub gmail: SourceSettings,
    pub github: SourceSettings,
    pub scan_timeout: Duration,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassifierSettings {
    pub excerpt_chars: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionSettings {
    pub agent: AgentSettings,
    pub delay: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolved configuration
#[derive(Clone)]
pub struct ResolvedConfig {
    pub openai: OpenAiSettings,
    pub google: Option<GoogleCredentials>,
    pub github_token: Option<String>,
    pub sources: SourceSet,
    pub classifier: ClassifierSettings,
    pub execution: ExecutionSettings,
    pub server: ServerSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// `version` declared by the config file
    pub config_version: Option<String>,
}

impl ResolvedConfig {
    /// Printable view with every secret left out
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "configFile": self.config_file,
            "configVersion": self.config_version,
            "openai": self.openai,
            "openaiApiKey": "<set>",
            "google": self.google.as_ref().map(|g| serde_json::json!({
                "clientEmail": g.client_email,
                "impersonate": g.subject,
            })),
            "githubToken": self.github_token.as_ref().map(|_| "<set>"),
            "sources": self.sources,
            "classifier": self.classifier,
            "execution": {
                "temperature": self.execution.agent.temperature,
                "maxTokens": self.execution.agent.max_tokens,
                "timeoutSeconds": self.execution.agent.timeout.as_secs(),
                "delayMs": self.execution.delay.as_millis() as u64,
            },
            "server": self.server,
        })
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Service-account keys arrive with literal `\n` sequences from env files
fn unescape_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Combine a parsed file with environment lookups
fn resolve(
    file: ConfigFile,
    config_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, PipelineError> {
    let api_key = non_empty(env("OPENAI_API_KEY"))
        .ok_or_else(|| PipelineError::ConfigurationMissing("OPENAI_API_KEY".to_string()))?;

    let openai = OpenAiSettings {
        api_key,
        model: non_empty(env("OPENAI_MODEL")).unwrap_or_else(|| "gpt-4".to_string()),
        base_url: non_empty(env("OPENAI_BASE_URL")).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    let google = match (
        non_empty(env("GOOGLE_CLIENT_EMAIL")),
        non_empty(env("GOOGLE_PRIVATE_KEY")),
    ) {
        (Some(client_email), Some(private_key)) => Some(GoogleCredentials {
            client_email,
            private_key: unescape_private_key(&private_key),
            subject: non_empty(env("GOOGLE_IMPERSONATE")),
        }),
        _ => None,
    };

    let sources_file = &file.sources;
    let sources = SourceSet {
        drive: SourceSettings::resolve(sources_file.drive.as_ref(), drive::DEFAULT_QUERY, 10),
        gmail: SourceSettings::resolve(sources_file.gmail.as_ref(), gmail::DEFAULT_QUERY, 20),
        github: SourceSettings::resolve(sources_file.github.as_ref(), github::DEFAULT_QUERY, 20),
        scan_timeout: Duration::from_secs(sources_file.scan_timeout_seconds.unwrap_or(60)),
    };

    let classifier = ClassifierSettings {
        excerpt_chars: file
            .classifier
            .as_ref()
            .and_then(|c| c.excerpt_chars)
            .unwrap_or(DEFAULT_EXCERPT_CHARS),
        timeout: Duration::from_secs(
            file.classifier
                .as_ref()
                .and_then(|c| c.timeout_seconds)
                .unwrap_or(30),
        ),
    };

    let defaults = AgentSettings::default();
    let exec = file.execution.as_ref();
    let execution = ExecutionSettings {
        agent: AgentSettings {
            temperature: exec.and_then(|e| e.temperature).unwrap_or(defaults.temperature),
            max_tokens: exec.and_then(|e| e.max_tokens).unwrap_or(defaults.max_tokens),
            timeout: exec
                .and_then(|e| e.timeout_seconds)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        },
        delay: Duration::from_millis(exec.and_then(|e| e.delay_ms).unwrap_or(2000)),
    };

    let server_file = file.server.as_ref();
    let port = match env("EXECUTIONER_PORT") {
        Some(raw) => raw.parse().map_err(|_| {
            PipelineError::ConfigurationMissing(format!("EXECUTIONER_PORT is not a port: {}", raw))
        })?,
        None => server_file.and_then(|s| s.port).unwrap_or(3000),
    };
    let server = ServerSettings {
        host: non_empty(env("EXECUTIONER_HOST"))
            .or_else(|| server_file.and_then(|s| s.host.clone()))
            .unwrap_or_else(|| "127.0.0.1".to_string()),
        port,
    };

    Ok(ResolvedConfig {
        openai,
        google,
        github_token: non_empty(env("GITHUB_TOKEN")),
        sources,
        classifier,
        execution,
        server,
        config_file,
        config_version: file.version,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(file, config_file, |key| std::env::var(key).ok())?)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
