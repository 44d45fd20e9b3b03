//! Webhook email payload.
//!
//! The proxy never inspects request bodies; this type exists for clients
//! that post to the email webhook through it.

use serde::{Deserialize, Serialize};

/// Body accepted by the email webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailPayload {
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl EmailPayload {
    /// The example notification used to exercise the webhook.
    pub fn sample() -> Self {
        Self {
            to: vec!["recipient@example.com".to_string()],
            cc: vec![
                "ccperson1@example.com".to_string(),
                "ccperson2@example.com".to_string(),
            ],
            subject: "reg: Your car is ready for pick up".to_string(),
            body: "Hello,\n\nAn ambulance has been dispatched to your location. Additionally, \
                   your car will be picked up for towing in 15 minutes and will arrive at the \
                   service centre within 45 minutes.\n\nStay safe,\nSupport Team"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_webhook_shape() {
        let value = serde_json::to_value(EmailPayload::sample()).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["body", "cc", "subject", "to"]);
        assert_eq!(value["cc"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn cc_is_optional() {
        let payload: EmailPayload = serde_json::from_value(json!({
            "to": ["a@example.com"],
            "subject": "hi",
            "body": "text",
        }))
        .unwrap();
        assert!(payload.cc.is_empty());
    }
}
