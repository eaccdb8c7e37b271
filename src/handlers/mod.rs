pub mod actions;

use crate::voting::nomination::NOMINATE_TOKEN;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STRIPE_CONTROL: Regex =
        Regex::new(r"^(vote|star)-([A-Za-z0-9_]+)-(\d+)$").unwrap();
    static ref RANK_CONTROL: Regex = Regex::new(r"^rank-(add|remove|up|down)-(.+)$").unwrap();
    static ref ACCEPTED_CONTROL: Regex = Regex::new(r"^accepted-(\d+)$").unwrap();
    static ref TAB_CONTROL: Regex = Regex::new(r"^tab-(.+)$").unwrap();
}

/// Everything a user can do to a review page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Vote { criterion: String, value: i32 },
    Star { criterion: String, position: i32 },
    Nominate,
    Select(String),
    Deselect(String),
    MoveUp(String),
    MoveDown(String),
    SetAccepted(usize),
    ShowTab(String),
    ReasonInput(String),
    FeedbackInput(String),
    CommentInput(String),
}

/// Maps the id of a clicked control to its event. Control ids look like
/// `vote-<criterion>-<value>`, `star-<criterion>-<position>`, `nominate`,
/// `rank-(add|remove|up|down)-<item>`, `accepted-<n>` and `tab-<name>`.
pub fn parse_control_id(control_id: &str) -> Option<UiEvent> {
    if control_id == NOMINATE_TOKEN {
        return Some(UiEvent::Nominate);
    }
    // Format: vote-<criterion>-<value> or star-<criterion>-<position>
    if let Some(caps) = STRIPE_CONTROL.captures(control_id) {
        let criterion = caps[2].to_string();
        let value: i32 = caps[3].parse().ok()?;
        return Some(match &caps[1] {
            "vote" => UiEvent::Vote { criterion, value },
            _ => UiEvent::Star {
                criterion,
                position: value,
            },
        });
    }
    // Item ids are everything after the action, hyphens included
    if let Some(caps) = RANK_CONTROL.captures(control_id) {
        let id = caps[2].to_string();
        return Some(match &caps[1] {
            "add" => UiEvent::Select(id),
            "remove" => UiEvent::Deselect(id),
            "up" => UiEvent::MoveUp(id),
            _ => UiEvent::MoveDown(id),
        });
    }
    // Quantity selector
    if let Some(caps) = ACCEPTED_CONTROL.captures(control_id) {
        return caps[1].parse().ok().map(UiEvent::SetAccepted);
    }
    if let Some(caps) = TAB_CONTROL.captures(control_id) {
        return Some(UiEvent::ShowTab(caps[1].to_string()));
    }
    None
}

pub fn rank_control_id(action: &str, item_id: &str) -> String {
    format!("rank-{}-{}", action, item_id)
}
