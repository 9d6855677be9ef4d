//! Keyword scoring over the routing labels, used when no trained model is configured.

use crate::{
    error::ClassifierError,
    routing::{HARDWARE_ISSUE, PASSWORD_RESET, SOFTWARE_BUG},
    text, TicketClassifier,
};

/// Category reported when no label keyword matches.
pub const UNMATCHED_CATEGORY: &str = "other";

const KEYWORDS: [(&str, &[&str]); 3] = [
    (
        HARDWARE_ISSUE,
        &[
            "hardware", "laptop", "desktop", "monitor", "screen", "keyboard", "mouse", "printer",
            "battery", "charger", "cable", "power", "broken", "cracked", "device", "headset",
            "dock", "overheating", "boot",
        ],
    ),
    (
        SOFTWARE_BUG,
        &[
            "bug", "crash", "crashes", "crashed", "error", "exception", "software", "app",
            "application", "freeze", "freezes", "glitch", "update", "install", "installed",
            "broken", "button", "feature", "wrong",
        ],
    ),
    (
        PASSWORD_RESET,
        &[
            "password", "reset", "login", "log", "locked", "lockout", "account", "credentials",
            "forgot", "forgotten", "sign", "unlock", "expired", "mfa",
        ],
    ),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Label with the most keyword hits; earlier labels win ties.
    pub fn best_label(&self, ticket: &str) -> &'static str {
        let tokens = text::tokens(ticket);
        let mut best = UNMATCHED_CATEGORY;
        let mut best_hits = 0;
        for (label, keywords) in KEYWORDS {
            let hits = tokens
                .iter()
                .filter(|token| keywords.contains(&token.as_str()))
                .count();
            if hits > best_hits {
                best = label;
                best_hits = hits;
            }
        }
        best
    }
}

impl TicketClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn predict(&self, text: &str) -> Result<String, ClassifierError> {
        Ok(self.best_label(text).to_string())
    }
}
