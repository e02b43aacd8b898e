use std::collections::HashMap;

use super::data::TemplateData;
use crate::session::Session;

/// Session key holding the caller's address, written by the home page
pub const REMOTE_IP_KEY: &str = "remote_ip";
pub const CSRF_TOKEN_KEY: &str = "csrf_token";
pub const FLASH_KEY: &str = "flash";
pub const WARNING_KEY: &str = "warning";
pub const ERROR_KEY: &str = "error";

/// Injects data every page gets, without touching what the handler set.
///
/// A field counts as set when it is a non-empty string or present in its map.
#[derive(Debug, Clone, Default)]
pub struct DataMerger {
    globals: HashMap<String, String>,
}

impl DataMerger {
    pub fn new(globals: HashMap<String, String>) -> Self {
        Self { globals }
    }

    pub async fn merge(&self, mut data: TemplateData, session: Option<&Session>) -> TemplateData {
        if let Some(session) = session {
            if data.csrf_token.is_empty() {
                data.csrf_token = csrf_token(session).await;
            }

            // Flash-style messages are shown once
            for (field, key) in [
                (&mut data.flash, FLASH_KEY),
                (&mut data.warning, WARNING_KEY),
                (&mut data.error, ERROR_KEY),
            ] {
                if field.is_empty() {
                    if let Some(message) = session.pop_string(key).await {
                        *field = message;
                    }
                }
            }

            if !data.has_string(REMOTE_IP_KEY) {
                if let Some(ip) = session.get_string(REMOTE_IP_KEY).await {
                    data.string_map.insert(REMOTE_IP_KEY.to_string(), ip);
                }
            }
        }

        for (key, value) in &self.globals {
            if !data.has_string(key) {
                data.string_map.insert(key.clone(), value.clone());
            }
        }

        data
    }
}

/// The session's CSRF token, created on first use
async fn csrf_token(session: &Session) -> String {
    if let Some(token) = session.get_string(CSRF_TOKEN_KEY).await {
        return token;
    }

    let token = generate_token();
    if let Err(e) = session.put(CSRF_TOKEN_KEY, token.clone()).await {
        tracing::warn!(error = %e, "Failed to store CSRF token in session");
    }
    token
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
