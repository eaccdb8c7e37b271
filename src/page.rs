use crate::draft::{Draft, DraftStore};
use crate::handlers::actions::{ActionOutcome, Actions, CommentTarget, Region, Transport};
use crate::handlers::{UiEvent, parse_control_id};
use crate::models::{ConfigError, CriterionKind, PageConfig};
use crate::templates::{TemplateError, TemplateRegistry};
use crate::voting::nomination::NominationView;
use crate::voting::ranked::RankedView;
use crate::voting::reason::ReasonView;
use crate::voting::stripe::{MOST_NEGATIVE, StripeView};
use crate::voting::{Nomination, RankedList, ReasonField, VotingStripes};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Template used for rows in the selected container.
pub const ORDERED_ROW_TEMPLATE: &str = "ordered_row";

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub stripes: Vec<StripeView>,
    pub submit_enabled: bool,
    pub nomination: NominationView,
    pub reason: ReasonView,
    pub ranked: Option<RankedView>,
    pub active_tab: Option<String>,
    pub regions: BTreeMap<Region, String>,
}

/// One review page: every controller, wired together, owned by the page
/// instance that attached them.
pub struct ReviewPage {
    proposal_id: Option<String>,
    primary: Option<String>,
    stripes: VotingStripes,
    nomination: Nomination,
    reason: ReasonField,
    ranked: Option<RankedList>,
    templates: TemplateRegistry,
    tabs: Vec<String>,
    active_tab: Option<usize>,
    feedback: String,
    comment: String,
    regions: BTreeMap<Region, String>,
    drafts: DraftStore,
    restoring: bool,
}

impl ReviewPage {
    pub fn attach(config: PageConfig, drafts: DraftStore) -> Result<Self, PageError> {
        config.validate()?;
        let templates = TemplateRegistry::from_sources(
            config
                .templates
                .iter()
                .map(|(id, source)| (id.as_str(), source.as_str())),
        )?;

        // Pages without talks carry no ranked list at all
        let ranked = if config.talks.is_empty() {
            None
        } else {
            Some(match &config.existing {
                Some(existing) => {
                    RankedList::with_existing(config.talks.clone(), &config.list, existing)
                }
                None => RankedList::new(config.talks.clone(), &config.list),
            })
        };

        let mut page = Self {
            proposal_id: config.proposal_id,
            primary: config.primary_criterion,
            stripes: VotingStripes::new(&config.criteria),
            nomination: Nomination::new(),
            reason: ReasonField::new(),
            ranked,
            templates,
            active_tab: if config.tabs.is_empty() { None } else { Some(0) },
            tabs: config.tabs,
            feedback: String::new(),
            comment: String::new(),
            regions: BTreeMap::new(),
            drafts,
            restoring: false,
        };
        page.refresh_vote_state();
        // Draft goes on top of whatever the server embedded
        page.restore_draft();
        info!(
            "Attached review page for proposal {}",
            page.proposal_id.as_deref().unwrap_or("<none>")
        );
        Ok(page)
    }

    /// Routes a clicked control. Unknown ids are logged and ignored.
    pub fn click(&mut self, control_id: &str) -> bool {
        match parse_control_id(control_id) {
            Some(event) => self.dispatch(event),
            None => {
                warn!("Unhandled control id: {}", control_id);
                false
            }
        }
    }

    pub fn dispatch(&mut self, event: UiEvent) -> bool {
        debug!("Dispatching {:?}", event);
        match event {
            UiEvent::Vote { criterion, value } => self.choose(&criterion, value, false),
            UiEvent::Star {
                criterion,
                position,
            } => self.choose(&criterion, position, true),
            UiEvent::Nominate => self.toggle_nomination(),
            UiEvent::Select(id) => self.with_ranked(|list| list.select(&id)),
            UiEvent::Deselect(id) => self.with_ranked(|list| list.deselect(&id)),
            UiEvent::MoveUp(id) => self.with_ranked(|list| list.move_up(&id)),
            UiEvent::MoveDown(id) => self.with_ranked(|list| list.move_down(&id)),
            UiEvent::SetAccepted(n) => self.with_ranked(|list| {
                list.set_accepted(n);
                true
            }),
            UiEvent::ShowTab(name) => self.show_tab(&name),
            UiEvent::ReasonInput(text) => self.reason.set_text(&text),
            UiEvent::FeedbackInput(text) => {
                self.feedback = text;
                true
            }
            UiEvent::CommentInput(text) => {
                self.comment = text;
                true
            }
        }
    }

    fn choose(&mut self, criterion: &str, value: i32, star: bool) -> bool {
        let kind_matches = self
            .stripes
            .stripes()
            .iter()
            .find(|s| s.criterion_id() == criterion)
            .is_some_and(|s| matches!(s.kind(), CriterionKind::Stars { .. }) == star);
        if !kind_matches {
            warn!("Control does not belong to a stripe of criterion {}", criterion);
            return false;
        }
        // Out-of-range values are rejected inside the stripe
        if !self.stripes.choose(criterion, value) {
            return false;
        }
        self.refresh_vote_state();
        self.save_draft();
        true
    }

    fn toggle_nomination(&mut self) -> bool {
        if !self.nomination.click() {
            return false;
        }
        self.save_draft();
        true
    }

    /// Derived state after any stripe change: the reason box follows the
    /// primary stripe, nomination follows "any stripe set".
    fn refresh_vote_state(&mut self) {
        let negative = self
            .primary
            .as_deref()
            .is_some_and(|primary| self.stripes.value(primary) == Some(MOST_NEGATIVE));
        self.reason.set_negative(negative);
        self.nomination.set_available(self.stripes.any_set());
    }

    fn with_ranked(&mut self, op: impl FnOnce(&mut RankedList) -> bool) -> bool {
        match self.ranked.as_mut() {
            Some(list) => op(list),
            None => {
                debug!("Page has no ranked list");
                false
            }
        }
    }

    pub fn show_tab(&mut self, name: &str) -> bool {
        match self.tabs.iter().position(|tab| tab == name) {
            Some(index) => {
                self.active_tab = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn draft(&self) -> Draft {
        Draft {
            controls: self.stripes.selected_controls(),
            nominated: self.nomination.is_flagged(),
        }
    }

    fn save_draft(&mut self) {
        if self.restoring {
            return;
        }
        let Some(proposal_id) = self.proposal_id.clone() else {
            return;
        };
        let draft = self.draft();
        self.drafts.save(&proposal_id, &draft);
    }

    /// Applies a saved draft through the same paths a click takes, in the
    /// recorded order, then nomination last.
    fn restore_draft(&mut self) {
        let Some(proposal_id) = self.proposal_id.as_deref() else {
            return;
        };
        let Some(draft) = self.drafts.load(proposal_id) else {
            return;
        };
        info!(
            "Restoring draft for proposal {} ({} controls)",
            proposal_id,
            draft.controls.len()
        );
        self.restoring = true;
        // Start from a clean stripe set so the replay owns every value
        self.stripes.reset();
        self.refresh_vote_state();
        for control in &draft.controls {
            match parse_control_id(control) {
                Some(event @ (UiEvent::Vote { .. } | UiEvent::Star { .. })) => {
                    self.dispatch(event);
                }
                _ => warn!("Skipping unexpected draft token {}", control),
            }
        }
        // Only after the stripes, which make nomination available
        if draft.nominated && !self.nomination.is_flagged() {
            self.toggle_nomination();
        }
        self.restoring = false;
    }

    /// Every stripe set, and on a thunderdome page every talk ranked.
    pub fn submit_enabled(&self) -> bool {
        self.stripes.is_complete() && self.ranked.as_ref().is_none_or(RankedList::submit_enabled)
    }

    pub fn vote_form(&self) -> Vec<(String, String)> {
        let mut form = self.stripes.form_fields();
        form.push(("nominate".to_string(), self.nomination.field_value().to_string()));
        if let Some(reason) = self.reason.form_value() {
            form.push(("reason".to_string(), reason.to_string()));
        }
        // ranked ids and the accepted count ride along with the vote
        if let Some(list) = &self.ranked {
            form.extend(list.form_fields());
        }
        form
    }

    pub fn ranked(&self) -> Option<&RankedList> {
        self.ranked.as_ref()
    }

    pub fn stripes(&self) -> &VotingStripes {
        &self.stripes
    }

    pub fn nomination(&self) -> &Nomination {
        &self.nomination
    }

    pub fn reason(&self) -> &ReasonField {
        &self.reason
    }

    pub fn feedback_text(&self) -> &str {
        &self.feedback
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.map(|index| self.tabs[index].as_str())
    }

    pub fn region(&self, region: Region) -> Option<&str> {
        self.regions.get(&region).map(String::as_str)
    }

    /// Renders the selected container with the `ordered_row` template.
    pub fn render_selected(&self) -> Result<String, TemplateError> {
        let Some(list) = &self.ranked else {
            return Ok(String::new());
        };
        let mut html = String::new();
        for row in list.rows() {
            html.push_str(&self.templates.render_serialized(ORDERED_ROW_TEMPLATE, &row)?);
        }
        Ok(html)
    }

    /// Swaps a returned fragment into its region. Failures leave the page
    /// as it was.
    pub fn apply(&mut self, outcome: &ActionOutcome) -> bool {
        match outcome {
            ActionOutcome::Fragment { region, html } => {
                debug!("Replacing #{}", region.element_id());
                self.regions.insert(*region, html.clone());
                true
            }
            _ => false,
        }
    }

    async fn finish<T: Transport>(&mut self, actions: &Actions<T>, outcome: ActionOutcome) -> ActionOutcome {
        // Activity buttons only change after something landed
        if self.apply(&outcome) {
            let activity = actions.refresh_activity().await;
            self.apply(&activity);
        }
        outcome
    }

    /// Sends the vote form. Returns `None` while the submit control is
    /// disabled. A stored fragment means the vote landed and the draft is
    /// dropped.
    pub async fn submit_vote<T: Transport>(&mut self, actions: &Actions<T>) -> Option<ActionOutcome> {
        if !self.submit_enabled() {
            debug!("Vote submit ignored: criteria or ranking incomplete");
            return None;
        }
        let outcome = actions.submit_vote(&self.vote_form()).await;
        if outcome.is_fragment() {
            if let Some(proposal_id) = self.proposal_id.as_deref() {
                self.drafts.clear(proposal_id);
            }
        }
        Some(self.finish(actions, outcome).await)
    }

    pub async fn mark_read<T: Transport>(&mut self, actions: &Actions<T>) -> ActionOutcome {
        let outcome = actions.mark_read().await;
        self.finish(actions, outcome).await
    }

    pub async fn send_feedback<T: Transport>(&mut self, actions: &Actions<T>) -> ActionOutcome {
        let outcome = actions.send_feedback(&self.feedback).await;
        if outcome.is_fragment() {
            self.feedback.clear();
        }
        self.finish(actions, outcome).await
    }

    pub async fn add_comment<T: Transport>(&mut self, actions: &Actions<T>, target: CommentTarget) -> ActionOutcome {
        let outcome = actions.add_comment(&self.comment, target).await;
        if outcome.is_fragment() {
            self.comment.clear();
        }
        self.finish(actions, outcome).await
    }

    pub async fn toggle_bookmark<T: Transport>(&mut self, actions: &Actions<T>, action: &str) -> ActionOutcome {
        let outcome = actions.toggle_bookmark(action).await;
        self.finish(actions, outcome).await
    }

    pub fn view(&self) -> PageView {
        PageView {
            stripes: self.stripes.views(),
            submit_enabled: self.submit_enabled(),
            nomination: self.nomination.view(),
            reason: self.reason.view(),
            ranked: self.ranked.as_ref().map(RankedList::view),
            active_tab: self.active_tab().map(str::to_string),
            regions: self.regions.clone(),
        }
    }
}
