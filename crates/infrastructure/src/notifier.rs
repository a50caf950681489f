use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, instrument};

use responder_core::config::NotifierConfig;
use responder_core::traits::VoiceNotifier;
use responder_core::ResponderResult;

use crate::http::{build_client, ensure_success, transport_error};

const SERVICE: &str = "voice-notifier";

/// Places an outbound phone call that speaks `message` as its first line.
pub struct VapiNotifier {
    http: Client,
    endpoint: String,
    auth_token: String,
    phone_number_id: String,
}

impl VapiNotifier {
    pub fn new(config: &NotifierConfig) -> ResponderResult<Self> {
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
            endpoint: format!("{}/call", config.api_base.trim_end_matches('/')),
            auth_token: config.auth_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
        })
    }

    fn payload(&self, recipient: &str, message: &str) -> Value {
        json!({
            "type": "outboundPhoneCall",
            "phoneNumberId": self.phone_number_id,
            "customer": { "number": recipient },
            "assistant": { "firstMessage": message },
        })
    }
}

#[async_trait]
impl VoiceNotifier for VapiNotifier {
    #[instrument(skip(self, message))]
    async fn notify(&self, recipient: &str, message: &str) -> ResponderResult<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(&self.payload(recipient, message))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;
        info!("outbound call placed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let config = NotifierConfig {
            enabled: true,
            auth_token: "token".to_string(),
            phone_number_id: "pn-1".to_string(),
            recipient_number: "+15550100".to_string(),
            ..NotifierConfig::default()
        };
        let notifier = VapiNotifier::new(&config).unwrap();
        let payload = notifier.payload("+15550100", "This is a critical dispatch alert.");

        assert_eq!(payload["type"], "outboundPhoneCall");
        assert_eq!(payload["phoneNumberId"], "pn-1");
        assert_eq!(payload["customer"]["number"], "+15550100");
        assert_eq!(payload["assistant"]["firstMessage"], "This is a critical dispatch alert.");
        assert_eq!(notifier.endpoint, "https://api.vapi.ai/call");
    }
}
