use crate::voting::stripe::ButtonStyle;
use log::debug;
use serde::Serialize;

pub const NOMINATE_LABEL: &str = "Nominate for Special Consideration";
pub const NOMINATED_LABEL: &str = "Nominated for Special Consideration!";

/// Draft token recorded when the nomination flag is on.
pub const NOMINATE_TOKEN: &str = "nominate";

#[derive(Debug, Clone, Default)]
pub struct Nomination {
    flagged: bool,
    available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NominationView {
    pub field_value: &'static str,
    pub label: &'static str,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Nomination {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user click. Ignored while the control is disabled.
    pub fn click(&mut self) -> bool {
        if !self.available {
            debug!("Nomination click ignored: no criterion set");
            return false;
        }
        self.toggle();
        true
    }

    fn toggle(&mut self) {
        self.flagged = !self.flagged;
    }

    /// Nomination is offered once any stripe holds a value. Losing that
    /// while flagged clears the flag through the same toggle a click uses.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
        if !available && self.flagged {
            self.toggle();
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn field_value(&self) -> &'static str {
        if self.flagged { "1" } else { "0" }
    }

    pub fn view(&self) -> NominationView {
        NominationView {
            field_value: self.field_value(),
            label: if self.flagged {
                NOMINATED_LABEL
            } else {
                NOMINATE_LABEL
            },
            style: if self.flagged {
                ButtonStyle::Success
            } else {
                ButtonStyle::Default
            },
            disabled: !self.available,
        }
    }
}
