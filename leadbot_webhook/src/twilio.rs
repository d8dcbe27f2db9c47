use async_trait::async_trait;
use leadbot_core::{MessageGateway, OutboundMessage};
use reqwest::Client;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio Messages API client used to deliver replies.
#[derive(Clone)]
pub struct TwilioGateway {
    client: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl TwilioGateway {
    pub fn new(account_sid: String, auth_token: String) -> Self {
        debug!("Creating TwilioGateway for account {}", mask_sid(&account_sid));
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

/// Keep the `AC` prefix and last four characters of an account SID.
fn mask_sid(sid: &str) -> String {
    let count = sid.chars().count();
    if count <= 8 {
        return "***".to_string();
    }
    let head: String = sid.chars().take(2).collect();
    let tail: String = sid.chars().skip(count - 4).collect();
    format!("{head}***{tail}")
}

#[async_trait]
impl MessageGateway for TwilioGateway {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("Body", message.body.as_str()),
                ("From", message.from.as_str()),
                ("To", message.to.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio returned HTTP {status}: {body}");
        }

        debug!("Twilio accepted message to {}", message.to);
        Ok(())
    }
}
