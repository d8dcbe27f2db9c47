use leadbot_config::Config;

/// Strategy for displaying the effective configuration.
///
/// Secrets are masked; everything else is printed as loaded, after
/// environment overrides.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== leadbot Configuration ===\n");

        println!("Gemini:");
        println!("  API Key: {}", mask_secret(&config.providers.gemini.api_key));
        println!("  Model: {}", config.providers.gemini.model);
        if let Some(ref url) = config.providers.gemini.base_url {
            println!("  Base URL: {url}");
        }
        println!();

        println!("Twilio:");
        println!("  Account SID: {}", mask_secret(&config.twilio.account_sid));
        println!("  Auth Token: {}", mask_secret(&config.twilio.auth_token));
        println!("  From: {}", config.twilio.from);
        if let Some(ref url) = config.twilio.base_url {
            println!("  Base URL: {url}");
        }
        println!();

        println!("Server:");
        println!("  Listen: {}:{}", config.server.host, config.server.port);
        println!();

        let conversation = &config.conversation;
        println!("Conversation:");
        println!("  Persona: {}", conversation.persona_name);
        println!("  Customer Label: {}", conversation.customer_label);
        println!(
            "  Closing Marker: {}",
            truncate(&conversation.closing_marker, 60)
        );
        if conversation.developments.is_empty() {
            println!("  Developments: (none)");
        } else {
            println!("  Developments: {}", conversation.developments.join(", "));
        }
        println!(
            "  Retry: {} attempts, {}ms initial backoff",
            conversation.max_attempts, conversation.initial_backoff_ms
        );

        match config.validate() {
            Ok(()) => println!("\nStatus: ready to serve"),
            Err(e) => println!("\nStatus: incomplete ({e})"),
        }

        Ok(())
    }
}

fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if secret.is_empty() {
        "(not set)".to_string()
    } else if count > 8 {
        let head: String = secret.chars().take(4).collect();
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
