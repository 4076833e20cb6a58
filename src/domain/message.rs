use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::classifier::Direction;

use super::types::Address;

/// A message that entered or left a folder.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub id: i64,
    pub account: i64,
    pub folder: String,
    pub direction: Direction,
    #[serde(default)]
    pub from: Vec<Address>,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub cc: Vec<Address>,
    #[serde(default)]
    pub bcc: Vec<Address>,
    #[serde(default)]
    pub reply: Vec<Address>,
    #[serde(default)]
    pub subject: Option<String>,
    /// Plain text already extracted from the message body.
    #[serde(default)]
    pub body: String,
    pub received: DateTime<Utc>,
    /// Set when the message got into its folder by an earlier auto-file.
    #[serde(default)]
    pub auto_classified: bool,
}

impl MessageEvent {
    /// Text fed to the classifier: addresses (email, domain, name), subject, then body.
    pub fn assemble_text(&self) -> String {
        let mut text = String::new();
        let addresses = self
            .from
            .iter()
            .chain(&self.to)
            .chain(&self.cc)
            .chain(&self.bcc)
            .chain(&self.reply);

        for address in addresses {
            if let Some(email) = address.email.as_deref().filter(|e| !e.is_empty()) {
                push_line(&mut text, email);
                if let Some((_, domain)) = email.split_once('@') {
                    if !domain.is_empty() {
                        push_line(&mut text, domain);
                    }
                }
            }
            if let Some(name) = address.name.as_deref().filter(|n| !n.is_empty()) {
                push_line(&mut text, name);
            }
        }

        if let Some(subject) = &self.subject {
            push_line(&mut text, subject);
        }
        text.push_str(&self.body);
        text
    }
}

fn push_line(text: &mut String, line: &str) {
    text.push_str(line);
    text.push('\n');
}
