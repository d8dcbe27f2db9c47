use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub conversation: ConversationSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeminiConfig::default_model")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: Self::default_model(),
            base_url: None,
        }
    }
}

impl GeminiConfig {
    fn default_model() -> String {
        "gemini-1.5-flash".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Fixed sender address used for every reply
    #[serde(default = "TwilioConfig::default_from")]
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from: Self::default_from(),
            base_url: None,
        }
    }
}

impl TwilioConfig {
    fn default_from() -> String {
        "whatsapp:+14155238886".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    const fn default_port() -> u16 {
        3000
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationSettings {
    #[serde(default = "ConversationSettings::default_persona_name")]
    pub persona_name: String,
    #[serde(default = "ConversationSettings::default_customer_label")]
    pub customer_label: String,
    /// Case-insensitive phrase whose presence in a reply ends the conversation
    #[serde(default = "ConversationSettings::default_closing_marker")]
    pub closing_marker: String,
    /// Developments the persona may suggest when asking about interest
    #[serde(default = "ConversationSettings::default_developments")]
    pub developments: Vec<String>,
    #[serde(default = "ConversationSettings::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "ConversationSettings::default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            persona_name: Self::default_persona_name(),
            customer_label: Self::default_customer_label(),
            closing_marker: Self::default_closing_marker(),
            developments: Self::default_developments(),
            max_attempts: Self::default_max_attempts(),
            initial_backoff_ms: Self::default_initial_backoff_ms(),
        }
    }
}

impl ConversationSettings {
    fn default_persona_name() -> String {
        "Heloísa".to_string()
    }

    fn default_customer_label() -> String {
        "Cliente".to_string()
    }

    fn default_closing_marker() -> String {
        "especialista entrará em contato".to_string()
    }

    fn default_developments() -> Vec<String> {
        vec![
            "Residencial Vista do Vale".to_string(),
            "Torres do Atlântico".to_string(),
        ]
    }

    const fn default_max_attempts() -> u32 {
        3
    }

    const fn default_initial_backoff_ms() -> u64 {
        1000
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("leadbot"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/leadbot/config.json` (defaults if absent), then apply
    /// environment overrides, including any `.env` in the working directory.
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env loaded: {e}"),
        }

        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            Self::load_from(&config_path)?
        } else {
            info!(
                "No config file at {}, using defaults and environment",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Override file values with whatever `lookup` returns for the known
    /// environment keys. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("GEMINI_API_KEY") {
            self.providers.gemini.api_key = v;
        }
        if let Some(v) = var("GEMINI_MODEL") {
            self.providers.gemini.model = v;
        }
        if let Some(v) = var("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = v;
        }
        if let Some(v) = var("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = v;
        }
        if let Some(v) = var("TWILIO_FROM_NUMBER") {
            self.twilio.from = v;
        }
        if let Some(v) = var("CLOSING_MARKER") {
            self.conversation.closing_marker = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {v:?}"))?;
        }

        Ok(())
    }

    /// Check that every credential needed to serve traffic is present.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.providers.gemini.api_key.is_empty() {
            anyhow::bail!(
                "Gemini API key not configured. Set \"providers.gemini.api_key\" or GEMINI_API_KEY"
            );
        }
        if self.twilio.account_sid.is_empty() || self.twilio.auth_token.is_empty() {
            anyhow::bail!(
                "Twilio credentials not configured. Set \"twilio.account_sid\"/\"twilio.auth_token\" or TWILIO_ACCOUNT_SID/TWILIO_AUTH_TOKEN"
            );
        }
        if self.conversation.closing_marker.trim().is_empty() {
            anyhow::bail!("\"conversation.closing_marker\" must not be empty");
        }
        Ok(())
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_path = Self::ensure_config_dir()?.join("config.json");
        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your Gemini API key and Twilio credentials");
        println!("   2. Point the Twilio WhatsApp sandbox webhook at http://<host>:<port>/webhook");
        println!("   3. Run 'leadbot serve'");
        println!();
        println!("🔧 Environment overrides:");
        println!("   GEMINI_API_KEY, GEMINI_MODEL, TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN,");
        println!("   TWILIO_FROM_NUMBER, CLOSING_MARKER, PORT");
        println!();
        Ok(())
    }

    /// Write the default template to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        let config_template = r#"{
  "providers": {
    "gemini": {
      "api_key": "your-gemini-api-key-here",
      "model": "gemini-1.5-flash"
    }
  },
  "twilio": {
    "account_sid": "your-twilio-account-sid",
    "auth_token": "your-twilio-auth-token",
    "from": "whatsapp:+14155238886"
  },
  "server": {
    "host": "0.0.0.0",
    "port": 3000
  },
  "conversation": {
    "persona_name": "Heloísa",
    "customer_label": "Cliente",
    "closing_marker": "especialista entrará em contato",
    "developments": ["Residencial Vista do Vale", "Torres do Atlântico"],
    "max_attempts": 3,
    "initial_backoff_ms": 1000
  }
}"#;

        std::fs::write(path, config_template)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.twilio.from, "whatsapp:+14155238886");
        assert_eq!(config.providers.gemini.model, "gemini-1.5-flash");
        assert_eq!(
            config.conversation.closing_marker,
            "especialista entrará em contato"
        );
        assert_eq!(config.conversation.max_attempts, 3);
        assert_eq!(config.conversation.initial_backoff_ms, 1000);
    }

    #[test]
    fn template_round_trips_through_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::write_template(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.conversation.persona_name, "Heloísa");
        assert_eq!(config.conversation.developments.len(), 2);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn write_template_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let err = Config::write_template(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn load_from_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("GEMINI_API_KEY", "g-key"),
                ("TWILIO_ACCOUNT_SID", "AC123"),
                ("TWILIO_AUTH_TOKEN", "tok"),
                ("TWILIO_FROM_NUMBER", "whatsapp:+15550001111"),
                ("CLOSING_MARKER", "obrigado"),
                ("PORT", "8080"),
                ("GEMINI_MODEL", ""),
            ]))
            .unwrap();

        assert_eq!(config.providers.gemini.api_key, "g-key");
        assert_eq!(config.providers.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.twilio.account_sid, "AC123");
        assert_eq!(config.twilio.from, "whatsapp:+15550001111");
        assert_eq!(config.conversation.closing_marker, "obrigado");
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn validate_requires_credentials() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.providers.gemini.api_key = "k".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Twilio"));

        config.twilio.account_sid = "AC".to_string();
        config.twilio.auth_token = "t".to_string();
        assert!(config.validate().is_ok());
    }
}
