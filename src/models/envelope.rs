//! Error bodies returned by the voting API.
//!
//! The backend is inconsistent: auth and candidate routes send
//! `{"error": {"code": "...", "message": "..."}}`, voter routes send
//! `{"error": "..."}`, and some proxies reply with `{"message": "..."}`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detailed {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorField>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    /// Parses a response body, tolerating non-JSON payloads.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn code(&self) -> Option<String> {
        match &self.error {
            Some(ErrorField::Detailed { code, .. }) => code.clone(),
            _ => None,
        }
    }

    /// Message to show, or `fallback` when the body carried none.
    pub fn message_or(&self, fallback: &str) -> String {
        let message = match &self.error {
            Some(ErrorField::Detailed { message, .. }) => message.clone(),
            Some(ErrorField::Plain(text)) => Some(text.clone()),
            None => None,
        };
        message
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
