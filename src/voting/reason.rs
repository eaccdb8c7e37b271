use serde::Serialize;

/// Characters the reason box allows before the counter goes negative.
pub const REASON_BUDGET: i64 = 63;

/// Free-text reason shown only while the primary vote is the most negative
/// choice. Text typed before switching away is kept in a single slot and
/// comes back when the negative choice is picked again.
#[derive(Debug, Clone, Default)]
pub struct ReasonField {
    text: String,
    remembered: Option<String>,
    enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonView {
    pub enabled: bool,
    pub text: String,
    pub remaining: i64,
}

impl ReasonField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_negative(&mut self, negative: bool) {
        if negative && !self.enabled {
            self.enabled = true;
            if let Some(text) = self.remembered.take() {
                self.text = text;
            }
        } else if !negative && self.enabled {
            self.enabled = false;
            self.remembered = Some(std::mem::take(&mut self.text));
        }
    }

    pub fn set_text(&mut self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.text = text.to_string();
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn remaining(&self) -> i64 {
        REASON_BUDGET - self.text.chars().count() as i64
    }

    pub fn form_value(&self) -> Option<&str> {
        self.enabled.then_some(self.text.as_str())
    }

    pub fn view(&self) -> ReasonView {
        ReasonView {
            enabled: self.enabled,
            text: self.text.clone(),
            remaining: self.remaining(),
        }
    }
}
