use crate::models::{ExistingRanking, Item, ListConfig, ListMode};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// A selected row as the `ordered_row` template sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub id: String,
    pub title: String,
    /// 1-based.
    pub rank: usize,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedView {
    pub available: Vec<Item>,
    pub selected: Vec<RankedRow>,
    pub placeholder_visible: bool,
    pub ranked_field: String,
    pub accepted: usize,
    pub submit_enabled: bool,
}

/// Two containers of talks. An item lives in exactly one of them; moving it
/// transfers it. Deselected items go back to their original page slot.
#[derive(Debug, Clone)]
pub struct RankedList {
    mode: ListMode,
    cap: Option<usize>,
    slots: HashMap<String, usize>,
    available: Vec<Item>,
    selected: Vec<Item>,
    accepted: usize,
}

impl RankedList {
    pub fn new(items: Vec<Item>, config: &ListConfig) -> Self {
        let slots = items
            .iter()
            .enumerate()
            .map(|(slot, item)| (item.id.clone(), slot))
            .collect();
        Self {
            mode: config.mode,
            cap: config.cap(),
            slots,
            available: items,
            selected: Vec::new(),
            accepted: 0,
        }
    }

    /// Pre-populates from a ranking the server already holds.
    pub fn with_existing(items: Vec<Item>, config: &ListConfig, existing: &ExistingRanking) -> Self {
        let mut list = Self::new(items, config);
        for id in &existing.ranked {
            if !list.select(id) {
                warn!("Existing ranking entry {} could not be restored", id);
            }
        }
        list.set_accepted(existing.accepted);
        list
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn is_full(&self) -> bool {
        self.cap.is_some_and(|cap| self.selected.len() >= cap)
    }

    /// No-op when at the cap or when `id` is not in the available list.
    pub fn select(&mut self, id: &str) -> bool {
        if self.is_full() {
            debug!("Selection cap reached, ignoring {}", id);
            return false;
        }
        let Some(index) = self.available.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = self.available.remove(index);
        self.selected.push(item);
        true
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        let Some(index) = self.selected.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = self.selected.remove(index);
        let slot = self.slot(&item.id);
        let at = self
            .available
            .iter()
            .position(|other| self.slot(&other.id) > slot)
            .unwrap_or(self.available.len());
        self.available.insert(at, item);
        true
    }

    fn slot(&self, id: &str) -> usize {
        self.slots.get(id).copied().unwrap_or(usize::MAX)
    }

    pub fn move_up(&mut self, id: &str) -> bool {
        match self.rank_index(id) {
            Some(index) if index > 0 => {
                self.selected.swap(index, index - 1);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: &str) -> bool {
        match self.rank_index(id) {
            Some(index) if index + 1 < self.selected.len() => {
                self.selected.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    fn rank_index(&self, id: &str) -> Option<usize> {
        if self.mode != ListMode::Ranking {
            return None;
        }
        self.selected.iter().position(|item| item.id == id)
    }

    /// The quantity selector. Highlighting is bounded by the selection
    /// length, the requested number is kept.
    pub fn set_accepted(&mut self, accepted: usize) {
        self.accepted = accepted;
    }

    pub fn accepted(&self) -> usize {
        self.accepted.min(self.selected.len())
    }

    pub fn available(&self) -> &[Item] {
        &self.available
    }

    pub fn selected(&self) -> &[Item] {
        &self.selected
    }

    pub fn placeholder_visible(&self) -> bool {
        self.selected.is_empty()
    }

    /// Ranking pages submit once every talk is ranked. Batch pages never
    /// hold the submit back.
    pub fn submit_enabled(&self) -> bool {
        match self.mode {
            ListMode::Ranking => self.available.is_empty(),
            ListMode::Batch => true,
        }
    }

    pub fn ranked_ids(&self) -> Vec<&str> {
        self.selected.iter().map(|item| item.id.as_str()).collect()
    }

    pub fn ranked_field(&self) -> String {
        self.ranked_ids().join(",")
    }

    pub fn rows(&self) -> Vec<RankedRow> {
        let accepted = self.accepted();
        self.selected
            .iter()
            .enumerate()
            .map(|(index, item)| RankedRow {
                id: item.id.clone(),
                title: item.title.clone(),
                rank: index + 1,
                accepted: index < accepted,
            })
            .collect()
    }

    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("ranked".to_string(), self.ranked_field()),
            ("accepted".to_string(), self.accepted().to_string()),
        ]
    }

    pub fn view(&self) -> RankedView {
        RankedView {
            available: self.available.clone(),
            selected: self.rows(),
            placeholder_visible: self.placeholder_visible(),
            ranked_field: self.ranked_field(),
            accepted: self.accepted(),
            submit_enabled: self.submit_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter()
            .map(|id| Item {
                id: id.to_string(),
                title: format!("Talk {}", id),
            })
            .collect()
    }

    fn ranking(cap: Option<usize>) -> ListConfig {
        ListConfig {
            mode: ListMode::Ranking,
            cap,
        }
    }

    #[test]
    fn cap_blocks_third_selection() {
        let mut list = RankedList::new(items(&["A", "B", "C"]), &ListConfig::default());
        assert!(list.select("A"));
        assert!(list.select("B"));
        assert!(!list.select("C"));

        assert_eq!(list.ranked_ids(), vec!["A", "B"]);
        assert_eq!(list.available(), &items(&["C"])[..]);
    }

    #[test]
    fn cap_holds_for_any_sequence() {
        let mut list = RankedList::new(items(&["A", "B", "C", "D"]), &ListConfig::default());
        let script = [
            ("s", "A"), ("s", "B"), ("s", "C"), ("d", "A"), ("s", "D"),
            ("s", "C"), ("d", "B"), ("d", "D"), ("s", "A"), ("s", "B"),
        ];
        for (op, id) in script {
            match op {
                "s" => list.select(id),
                _ => list.deselect(id),
            };
            assert!(list.selected().len() <= 2);
            assert_eq!(list.selected().len() + list.available().len(), 4);
        }
    }

    #[test]
    fn deselect_restores_original_slot() {
        let mut list = RankedList::new(items(&["A", "B", "C"]), &ListConfig::default());
        list.select("B");
        assert!(!list.placeholder_visible());
        list.deselect("B");
        assert_eq!(list.available(), &items(&["A", "B", "C"])[..]);
        assert!(list.placeholder_visible());
    }

    #[test]
    fn reorder_is_noop_at_boundaries() {
        let mut list = RankedList::new(items(&["A", "B", "C"]), &ranking(None));
        for id in ["A", "B", "C"] {
            list.select(id);
        }
        assert!(!list.move_up("A"));
        assert!(!list.move_down("C"));
        assert!(list.move_up("C"));
        assert_eq!(list.ranked_field(), "A,C,B");
        assert!(list.move_down("A"));
        assert_eq!(list.ranked_field(), "C,A,B");
    }

    #[test]
    fn batch_mode_has_no_reordering() {
        let mut list = RankedList::new(items(&["A", "B"]), &ListConfig::default());
        list.select("A");
        list.select("B");
        assert!(!list.move_up("B"));
        assert_eq!(list.ranked_field(), "A,B");
    }

    #[test]
    fn submit_enabled_once_everything_ranked() {
        let mut list = RankedList::new(items(&["A", "B"]), &ranking(None));
        list.select("A");
        assert!(!list.submit_enabled());
        list.select("B");
        assert!(list.submit_enabled());
    }

    #[test]
    fn batch_mode_submits_at_cap() {
        let mut list = RankedList::new(items(&["A", "B", "C"]), &ListConfig::default());
        assert!(list.submit_enabled());
        list.select("A");
        list.select("B");
        assert!(list.is_full());
        assert!(list.view().submit_enabled);
    }

    #[test]
    fn ranking_mode_ranks_past_two_without_cap() {
        let config = ListConfig {
            mode: ListMode::Ranking,
            ..ListConfig::default()
        };
        let mut list = RankedList::new(items(&["A", "B", "C"]), &config);
        for id in ["C", "A", "B"] {
            assert!(list.select(id));
        }
        assert!(list.submit_enabled());
        assert_eq!(list.ranked_field(), "C,A,B");
    }

    #[test]
    fn accepted_highlight_tracks_leading_rows() {
        let mut list = RankedList::new(items(&["A", "B", "C"]), &ranking(None));
        list.set_accepted(2);
        list.select("A");
        assert_eq!(list.accepted(), 1);
        list.select("B");
        list.select("C");
        let highlighted: Vec<_> = list.rows().iter().map(|r| r.accepted).collect();
        assert_eq!(highlighted, vec![true, true, false]);
        assert_eq!(
            list.form_fields(),
            vec![
                ("ranked".to_string(), "A,B,C".to_string()),
                ("accepted".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn restores_existing_ranking() {
        let existing = ExistingRanking {
            ranked: vec!["C".to_string(), "Z".to_string(), "A".to_string()],
            accepted: 1,
        };
        let list = RankedList::with_existing(items(&["A", "B", "C"]), &ranking(None), &existing);
        assert_eq!(list.ranked_ids(), vec!["C", "A"]);
        assert_eq!(list.rows()[0].rank, 1);
        assert!(list.rows()[0].accepted);
        assert!(!list.rows()[1].accepted);
    }
}
