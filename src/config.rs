use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
    pub tools: ToolsConfig,
    /// Directory holding `<name>.md` prompt overrides
    pub prompts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 4096,
            timeout_ms: 120000,
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Tool used for the single-task plan when the planner reply is unusable
    pub fallback_tool: String,
    pub max_tasks: usize,
    pub resolve_dependencies: bool,
    /// How much of each prior result the resolver shows the model
    pub result_preview_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_tool: "web_search".to_string(),
            max_tasks: 8,
            resolve_dependencies: true,
            result_preview_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub http_timeout_ms: Option<u64>,
    pub search: SearchConfig,
    pub weather: WeatherConfig,
    pub geocoding: GeocodingConfig,
    pub email: EmailConfig,
    pub translate: TranslateConfig,
}

impl ToolsConfig {
    pub fn http_timeout_ms(&self) -> u64 {
        self.http_timeout_ms.unwrap_or(30000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub engine: String,
    pub max_results: usize,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com/search.json".to_string(),
            engine: "google".to_string(),
            max_results: 5,
            api_key: None,
            api_key_env: "SERPAPI_API_KEY".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub units: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            units: "metric".to_string(),
            api_key: None,
            api_key_env: "WEATHER_API_KEY".to_string(),
        }
    }
}

impl WeatherConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub max_candidates: u32,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            max_candidates: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EmailConfig {
    pub fn smtp_server(&self) -> Option<String> {
        resolve_secret(&self.smtp_server, "SMTP_SERVER")
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
            .or_else(|| std::env::var("SMTP_PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(587)
    }

    pub fn username(&self) -> Option<String> {
        resolve_secret(&self.username, "SMTP_USER")
    }

    pub fn password(&self) -> Option<String> {
        resolve_secret(&self.password, "SMTP_PASSWORD")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub primary_url: String,
    pub backup_url: String,
    pub user_agent: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://translate.googleapis.com/translate_a/single".to_string(),
            backup_url: "https://clients5.google.com/translate_a/t".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36"
                .to_string(),
        }
    }
}

/// Explicit value wins, then the named environment variable. Blank values count as unset.
pub fn resolve_secret(explicit: &Option<String>, env_var: &str) -> Option<String> {
    let usable = |v: &String| !v.trim().is_empty();
    explicit
        .clone()
        .filter(usable)
        .or_else(|| std::env::var(env_var).ok().filter(usable))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            tools: ToolsConfig::default(),
            prompts_dir: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir
                .join(project_name)
                .join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!(
                            "Failed to load config from {}: {}",
                            primary_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GROQ_MODEL")
            && !model.trim().is_empty()
        {
            log::debug!("Model overridden by GROQ_MODEL: {}", model);
            self.llm.model = model;
        }
    }
}
