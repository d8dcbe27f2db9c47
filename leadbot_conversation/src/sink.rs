use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::extraction::{ExtractedLead, ExtractionOutcome};

/// Destination for qualified leads (a CRM in a real deployment).
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: &ExtractedLead) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct LeadRecord<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    interest: Option<&'a str>,
    phone: &'a str,
    full_history: &'a str,
    extraction: &'a ExtractionOutcome,
    extracted_at: String,
}

impl<'a> From<&'a ExtractedLead> for LeadRecord<'a> {
    fn from(lead: &'a ExtractedLead) -> Self {
        Self {
            name: lead.name(),
            email: lead.email(),
            interest: lead.interest(),
            phone: &lead.sender,
            full_history: &lead.transcript,
            extraction: &lead.outcome,
            extracted_at: lead.extracted_at.to_rfc3339(),
        }
    }
}

/// Writes each lead to the process log as pretty JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLeadSink;

impl LogLeadSink {
    pub fn render(lead: &ExtractedLead) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&LeadRecord::from(lead))?)
    }
}

#[async_trait]
impl LeadSink for LogLeadSink {
    async fn submit(&self, lead: &ExtractedLead) -> anyhow::Result<()> {
        let json = Self::render(lead)?;
        info!("--- LEAD QUALIFICADO! --- dados prontos para o CRM:\n{json}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::LeadFields;
    use chrono::Utc;

    fn lead(outcome: ExtractionOutcome) -> ExtractedLead {
        ExtractedLead {
            sender: "whatsapp:+5511999990000".to_string(),
            outcome,
            transcript: "Cliente: Oi\nHeloísa: Olá!\n".to_string(),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn record_includes_phone_and_history() {
        let parsed = lead(ExtractionOutcome::Parsed(LeadFields {
            name: Some("Marina".to_string()),
            email: None,
            interest: Some("Torres do Atlântico".to_string()),
        }));
        let value: serde_json::Value =
            serde_json::from_str(&LogLeadSink::render(&parsed).unwrap()).unwrap();

        assert_eq!(value["name"], "Marina");
        assert!(value["email"].is_null());
        assert_eq!(value["interest"], "Torres do Atlântico");
        assert_eq!(value["phone"], "whatsapp:+5511999990000");
        assert_eq!(value["full_history"], "Cliente: Oi\nHeloísa: Olá!\n");
        assert_eq!(value["extraction"]["status"], "parsed");
    }

    #[test]
    fn degraded_record_uses_sentinels() {
        let degraded = lead(ExtractionOutcome::Unparseable {
            raw: "nada".to_string(),
        });
        let value: serde_json::Value =
            serde_json::from_str(&LogLeadSink::render(&degraded).unwrap()).unwrap();

        assert_eq!(value["name"], crate::EXTRACTION_SENTINEL);
        assert_eq!(value["email"], crate::EXTRACTION_SENTINEL);
        assert_eq!(value["extraction"]["status"], "unparseable");
    }

    #[tokio::test]
    async fn log_sink_accepts_leads() {
        let sink = LogLeadSink;
        assert!(sink.submit(&lead(ExtractionOutcome::Unavailable {
            reason: "timeout".to_string()
        }))
        .await
        .is_ok());
    }
}
