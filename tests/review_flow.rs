use async_trait::async_trait;
use std::sync::Mutex;
use trusty_review::ReviewPage;
use trusty_review::draft::{DraftStore, FileStorage, MemoryStorage, Storage, StorageError};
use trusty_review::handlers::actions::{
    ActionOutcome, Actions, HttpResponse, Region, Transport, TransportError, VOTE_PATH,
};
use trusty_review::models::PageConfig;
use trusty_review::voting::star::StarState;
use trusty_review::voting::stripe::StripeControls;

const PAGE: &str = r#"{
    "proposal_id": "204",
    "criteria": [
        {"id": "overall", "label": "Overall"},
        {"id": "fit", "label": "Audience fit"},
        {"id": "clarity", "label": "Clarity", "kind": {"type": "stars", "count": 5}}
    ],
    "primary_criterion": "overall",
    "talks": [
        {"id": "A", "title": "Alpha"},
        {"id": "B", "title": "Beta"},
        {"id": "C", "title": "Gamma"}
    ],
    "list": {"mode": "batch", "cap": 2}
}"#;

/// Storage shared between two page instances, like one browser profile
/// across a reload.
#[derive(Default)]
struct SharedStorage(std::sync::Arc<Mutex<MemoryStorage>>);

impl Storage for SharedStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.lock().unwrap().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.0.lock().unwrap().remove(key)
    }
}

impl SharedStorage {
    fn handle(&self) -> Self {
        SharedStorage(self.0.clone())
    }
}

/// Answers every POST with 200 except `vote/`, and keeps each posted form.
struct ScriptedTransport {
    vote_status: u16,
    posted: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    fn new(vote_status: u16) -> Self {
        ScriptedTransport {
            vote_status,
            posted: Mutex::new(Vec::new()),
        }
    }

    fn form_for(&self, path: &str) -> Option<Vec<(String, String)>> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .find(|(posted, _)| posted == path)
            .map(|(_, form)| form.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        self.posted.lock().unwrap().push((path.to_string(), form.to_vec()));
        Ok(HttpResponse {
            status: if path == VOTE_PATH { self.vote_status } else { 200 },
            body: format!("<div>{}</div>", path),
        })
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: format!("<nav>{}</nav>", path),
        })
    }
}

fn page(storage: &SharedStorage) -> ReviewPage {
    ReviewPage::attach(
        PageConfig::from_json(PAGE).unwrap(),
        DraftStore::new(Box::new(storage.handle())),
    )
    .unwrap()
}

#[test]
fn draft_replay_reproduces_page_state() {
    let storage = SharedStorage::default();
    let mut before = page(&storage);
    before.click("vote-overall-2");
    before.click("star-clarity-2");
    before.click("nominate");
    assert!(!before.submit_enabled());

    let after = page(&storage);
    assert_eq!(after.view(), before.view());
    assert!(after.nomination().is_flagged());
    assert!(!after.view().nomination.disabled);
    assert_eq!(after.stripes().value("clarity"), Some(2));
    assert_eq!(after.stripes().value("fit"), None);
}

#[test]
fn draft_replays_reason_state_from_primary() {
    let storage = SharedStorage::default();
    let mut before = page(&storage);
    before.click("vote-overall-0");
    let after = page(&storage);
    assert!(after.reason().is_enabled());
}

#[test]
fn corrupt_draft_means_fresh_page() {
    let storage = SharedStorage::default();
    storage.handle().set("VOTES-204", "nominate").unwrap();
    let fresh = page(&storage);
    assert!(!fresh.stripes().any_set());
    assert!(!fresh.nomination().is_flagged());
}

#[test]
fn cap_scenario_keeps_c_available() {
    let storage = SharedStorage::default();
    let mut page = page(&storage);
    assert!(page.click("rank-add-A"));
    assert!(page.click("rank-add-B"));
    assert!(!page.click("rank-add-C"));

    let ranked = page.ranked().unwrap();
    assert_eq!(ranked.ranked_ids(), vec!["A", "B"]);
    assert_eq!(ranked.available().len(), 1);
    assert_eq!(ranked.available()[0].id, "C");

    assert!(page.click("rank-remove-A"));
    let ranked = page.ranked().unwrap();
    assert_eq!(ranked.available()[0].id, "A");
    assert_eq!(ranked.available()[0].title, "Alpha");
}

#[test]
fn later_star_click_refills_prefix() {
    let storage = SharedStorage::default();
    let mut page = page(&storage);
    page.click("star-clarity-1");
    page.click("star-clarity-3");
    page.click("star-clarity-0");

    let view = page.view();
    let StripeControls::Stars(stars) = &view.stripes[2].controls else {
        panic!("clarity renders as stars");
    };
    let states: Vec<_> = stars.iter().map(|s| s.state).collect();
    assert_eq!(states[0], StarState::Filled);
    assert!(states[1..].iter().all(|s| *s == StarState::Empty));
    assert_eq!(view.stripes[2].field_value, "0");
}

#[tokio::test]
async fn successful_submission_clears_draft() {
    let storage = SharedStorage::default();
    let mut page = page(&storage);
    for id in ["vote-overall-1", "vote-fit-2", "star-clarity-4"] {
        page.click(id);
    }
    let actions = Actions::new(
        ScriptedTransport::new(200),
        "activity_buttons/",
    );
    let outcome = page.submit_vote(&actions).await.unwrap();
    assert!(outcome.is_fragment());
    assert_eq!(page.region(Region::VoteState), Some("<div>vote/</div>"));
    assert_eq!(
        page.region(Region::ActivityButtons),
        Some("<nav>activity_buttons/</nav>")
    );
    assert!(storage.handle().get("VOTES-204").unwrap().is_none());

    let form = actions.transport().form_for(VOTE_PATH).unwrap();
    assert!(form.contains(&("overall".to_string(), "1".to_string())));
    assert!(form.contains(&("clarity".to_string(), "4".to_string())));
}

const THUNDERDOME: &str = r#"{
    "proposal_id": "311",
    "talks": [
        {"id": "A", "title": "Alpha"},
        {"id": "B", "title": "Beta"},
        {"id": "C", "title": "Gamma"}
    ],
    "list": {"mode": "ranking"}
}"#;

#[tokio::test]
async fn thunderdome_submits_full_ranking() {
    let storage = SharedStorage::default();
    let mut page = ReviewPage::attach(
        PageConfig::from_json(THUNDERDOME).unwrap(),
        DraftStore::new(Box::new(storage.handle())),
    )
    .unwrap();
    let actions = Actions::new(ScriptedTransport::new(200), "activity_buttons/");

    // two of three ranked, and the list has no cap
    page.click("rank-add-C");
    page.click("rank-add-A");
    assert!(!page.view().submit_enabled);
    assert!(page.submit_vote(&actions).await.is_none());
    assert!(actions.transport().form_for(VOTE_PATH).is_none());

    assert!(page.click("rank-add-B"));
    assert!(page.click("rank-up-B"));
    page.click("accepted-2");
    let view = page.view();
    assert!(view.submit_enabled);
    assert_eq!(view.ranked.unwrap().ranked_field, "C,B,A");

    let outcome = page.submit_vote(&actions).await.unwrap();
    assert!(outcome.is_fragment());
    let form = actions.transport().form_for(VOTE_PATH).unwrap();
    assert!(form.contains(&("ranked".to_string(), "C,B,A".to_string())));
    assert!(form.contains(&("accepted".to_string(), "2".to_string())));
}

#[tokio::test]
async fn rejected_submission_keeps_draft() {
    let storage = SharedStorage::default();
    let mut page = page(&storage);
    for id in ["vote-overall-1", "vote-fit-2", "star-clarity-4"] {
        page.click(id);
    }
    let actions = Actions::new(
        ScriptedTransport::new(403),
        "activity_buttons/",
    );
    let outcome = page.submit_vote(&actions).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::ServerError { status: 403, .. }));
    assert_eq!(page.region(Region::VoteState), None);
    assert!(storage.handle().get("VOTES-204").unwrap().is_some());
}

#[test]
fn file_backed_drafts_survive_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = || PageConfig::from_json(PAGE).unwrap();

    let mut first = ReviewPage::attach(
        config(),
        DraftStore::new(Box::new(FileStorage::new(dir.path()).unwrap())),
    )
    .unwrap();
    first.click("vote-fit-0");

    let second = ReviewPage::attach(
        config(),
        DraftStore::new(Box::new(FileStorage::new(dir.path()).unwrap())),
    )
    .unwrap();
    assert_eq!(second.stripes().value("fit"), Some(0));
}

#[test]
fn no_storage_means_no_restore() {
    let mut first = ReviewPage::attach(PageConfig::from_json(PAGE).unwrap(), DraftStore::unavailable()).unwrap();
    first.click("vote-fit-0");
    let second = ReviewPage::attach(PageConfig::from_json(PAGE).unwrap(), DraftStore::unavailable()).unwrap();
    assert!(!second.stripes().any_set());
}
