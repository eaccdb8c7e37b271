use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StarState {
    Filled,
    Empty,
}

impl StarState {
    pub fn class(self) -> &'static str {
        match self {
            StarState::Filled => "filled",
            StarState::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarView {
    pub control_id: String,
    pub position: u8,
    pub state: StarState,
}

pub fn control_id(criterion_id: &str, position: u8) -> String {
    format!("star-{}-{}", criterion_id, position)
}

/// Stars up to and including the clicked position are filled. The stored
/// value is the 0-based position, so a click on the first star stores 0.
pub fn star_states(count: u8, value: Option<i32>) -> Vec<StarState> {
    (0..count)
        .map(|position| match value {
            Some(v) if i32::from(position) <= v => StarState::Filled,
            _ => StarState::Empty,
        })
        .collect()
}

pub fn accepts(count: u8, value: i32) -> bool {
    value >= 0 && value < i32::from(count)
}

pub fn views(criterion_id: &str, count: u8, value: Option<i32>) -> Vec<StarView> {
    star_states(count, value)
        .into_iter()
        .enumerate()
        .map(|(position, state)| {
            let position = position as u8;
            StarView {
                control_id: control_id(criterion_id, position),
                position,
                state,
            }
        })
        .collect()
}
