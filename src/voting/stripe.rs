use crate::models::{Criterion, CriterionKind};
use crate::voting::star::{self, StarView};
use log::warn;
use serde::Serialize;

/// Hidden-field value of a stripe nobody has clicked yet.
pub const UNSET: i32 = -1;

/// The reject / neutral / accept values of a choice stripe.
pub const CHOICE_VALUES: [i32; 3] = [0, 1, 2];

/// Most negative choice; selecting it on the primary stripe asks for a reason.
pub const MOST_NEGATIVE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Default,
    Danger,
    Warning,
    Success,
}

impl ButtonStyle {
    pub fn for_value(value: i32) -> Self {
        match value {
            0 => ButtonStyle::Danger,
            1 => ButtonStyle::Warning,
            2 => ButtonStyle::Success,
            _ => ButtonStyle::Default,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            ButtonStyle::Default => "btn-default",
            ButtonStyle::Danger => "btn-danger",
            ButtonStyle::Warning => "btn-warning",
            ButtonStyle::Success => "btn-success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub control_id: String,
    pub value: i32,
    pub style: ButtonStyle,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "controls")]
pub enum StripeControls {
    Buttons(Vec<ButtonView>),
    Stars(Vec<StarView>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripeView {
    pub criterion_id: String,
    pub label: String,
    /// What the hidden form field currently holds.
    pub field_value: String,
    pub controls: StripeControls,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    criterion: Criterion,
    value: Option<i32>,
}

pub fn choice_control_id(criterion_id: &str, value: i32) -> String {
    format!("vote-{}-{}", criterion_id, value)
}

impl Stripe {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            value: None,
        }
    }

    pub fn criterion_id(&self) -> &str {
        &self.criterion.id
    }

    pub fn kind(&self) -> CriterionKind {
        self.criterion.kind
    }

    pub fn value(&self) -> Option<i32> {
        self.value
    }

    pub fn accepts(&self, value: i32) -> bool {
        match self.criterion.kind {
            CriterionKind::Choice => CHOICE_VALUES.contains(&value),
            CriterionKind::Stars { count } => star::accepts(count, value),
        }
    }

    pub fn control_id(&self, value: i32) -> String {
        match self.criterion.kind {
            CriterionKind::Choice => choice_control_id(&self.criterion.id, value),
            // accepts() already bounds value to the star count
            CriterionKind::Stars { .. } => star::control_id(&self.criterion.id, value as u8),
        }
    }

    pub fn field_value(&self) -> String {
        self.value.unwrap_or(UNSET).to_string()
    }

    pub fn view(&self) -> StripeView {
        let controls = match self.criterion.kind {
            CriterionKind::Choice => StripeControls::Buttons(
                CHOICE_VALUES
                    .iter()
                    .map(|&value| {
                        let selected = self.value == Some(value);
                        ButtonView {
                            control_id: choice_control_id(&self.criterion.id, value),
                            value,
                            style: if selected {
                                ButtonStyle::for_value(value)
                            } else {
                                ButtonStyle::Default
                            },
                            selected,
                        }
                    })
                    .collect(),
            ),
            CriterionKind::Stars { count } => {
                StripeControls::Stars(star::views(&self.criterion.id, count, self.value))
            }
        };
        StripeView {
            criterion_id: self.criterion.id.clone(),
            label: self.criterion.label.clone(),
            field_value: self.field_value(),
            controls,
        }
    }
}

/// One stripe per criterion. Stripes never influence each other.
#[derive(Debug, Clone, Default)]
pub struct VotingStripes {
    stripes: Vec<Stripe>,
}

impl VotingStripes {
    pub fn new(criteria: &[Criterion]) -> Self {
        Self {
            stripes: criteria.iter().cloned().map(Stripe::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stripes.is_empty()
    }

    pub fn stripes(&self) -> &[Stripe] {
        &self.stripes
    }

    /// Returns false (and leaves everything untouched) for an unknown
    /// criterion or a value the stripe does not offer.
    pub fn choose(&mut self, criterion_id: &str, value: i32) -> bool {
        let Some(stripe) = self
            .stripes
            .iter_mut()
            .find(|s| s.criterion.id == criterion_id)
        else {
            warn!("Ignoring choice for unknown criterion {}", criterion_id);
            return false;
        };
        if !stripe.accepts(value) {
            warn!("Ignoring out-of-range value {} for criterion {}", value, criterion_id);
            return false;
        }
        stripe.value = Some(value);
        true
    }

    pub fn reset(&mut self) {
        for stripe in &mut self.stripes {
            stripe.value = None;
        }
    }

    pub fn value(&self, criterion_id: &str) -> Option<i32> {
        self.stripes
            .iter()
            .find(|s| s.criterion.id == criterion_id)
            .and_then(|s| s.value)
    }

    pub fn is_complete(&self) -> bool {
        self.stripes.iter().all(|s| s.value.is_some())
    }

    pub fn any_set(&self) -> bool {
        self.stripes.iter().any(|s| s.value.is_some())
    }

    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.stripes
            .iter()
            .map(|s| (s.criterion.id.clone(), s.field_value()))
            .collect()
    }

    /// Control ids of every selected control, in stripe order.
    pub fn selected_controls(&self) -> Vec<String> {
        self.stripes
            .iter()
            .filter_map(|s| s.value.map(|v| s.control_id(v)))
            .collect()
    }

    pub fn views(&self) -> Vec<StripeView> {
        self.stripes.iter().map(Stripe::view).collect()
    }
}
