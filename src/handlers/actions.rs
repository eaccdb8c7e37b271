use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;

pub const VOTE_PATH: &str = "vote/";
pub const MARK_READ_PATH: &str = "mark_read/";
pub const FEEDBACK_PATH: &str = "feedback/";
pub const COMMENT_PATH: &str = "comment/";

/// Page regions that background actions replace wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    VoteState,
    Discussion,
    Messages,
    LeftColumn,
    ActivityButtons,
}

impl Region {
    pub fn element_id(self) -> &'static str {
        match self {
            Region::VoteState => "vote-status",
            Region::Discussion => "discussion",
            Region::Messages => "messages",
            Region::LeftColumn => "left-column",
            Region::ActivityButtons => "activity-buttons",
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `form` url-encoded. An empty form sends no body.
    async fn post(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError>;
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;
}

/// `reqwest` transport resolving relative endpoints against the page URL.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base = Url::parse(base_url).map_err(|_| TransportError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|_| TransportError::InvalidUrl(path.to_string()))
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.post(self.url(path)?);
        // mark_read and bookmark post nothing
        if !form.is_empty() {
            request = request.form(form);
        }
        Self::read(request.send().await?).await
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(self.url(path)?).send().await?;
        Self::read(response).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server answered with markup for `region`.
    Fragment { region: Region, html: String },
    ServerError { status: u16, body: String },
    NetworkError(String),
}

impl ActionOutcome {
    pub fn is_fragment(&self) -> bool {
        matches!(self, ActionOutcome::Fragment { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    /// Comment on the proposal being reviewed.
    Proposal,
    /// Comment queued while reviewing a batch of proposals.
    Batch,
}

impl CommentTarget {
    fn region(self) -> Region {
        match self {
            CommentTarget::Proposal => Region::Discussion,
            CommentTarget::Batch => Region::Messages,
        }
    }
}

/// Background form submissions. Every call is a single attempt.
pub struct Actions<T: Transport> {
    transport: T,
    activity_path: String,
}

impl<T: Transport> Actions<T> {
    pub fn new(transport: T, activity_path: impl Into<String>) -> Self {
        Self {
            transport,
            activity_path: activity_path.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn submit_vote(&self, form: &[(String, String)]) -> ActionOutcome {
        self.post(VOTE_PATH, form, Region::VoteState).await
    }

    pub async fn mark_read(&self) -> ActionOutcome {
        self.post(MARK_READ_PATH, &[], Region::Discussion).await
    }

    pub async fn send_feedback(&self, text: &str) -> ActionOutcome {
        let form = [("text".to_string(), text.to_string())];
        self.post(FEEDBACK_PATH, &form, Region::Discussion).await
    }

    pub async fn add_comment(&self, text: &str, target: CommentTarget) -> ActionOutcome {
        let form = [("text".to_string(), text.to_string())];
        self.post(COMMENT_PATH, &form, target.region()).await
    }

    /// The bookmark form carries its own endpoint in its `action` attribute.
    pub async fn toggle_bookmark(&self, action: &str) -> ActionOutcome {
        self.post(action, &[], Region::LeftColumn).await
    }

    pub async fn refresh_activity(&self) -> ActionOutcome {
        let result = self.transport.get(&self.activity_path).await;
        Self::outcome(&self.activity_path, result, Region::ActivityButtons)
    }

    async fn post(&self, path: &str, form: &[(String, String)], region: Region) -> ActionOutcome {
        info!("POST {} ({} fields)", path, form.len());
        let result = self.transport.post(path, form).await;
        Self::outcome(path, result, region)
    }

    fn outcome(path: &str, result: Result<HttpResponse, TransportError>, region: Region) -> ActionOutcome {
        match result {
            Ok(response) if response.is_success() => ActionOutcome::Fragment {
                region,
                html: response.body,
            },
            // Non-2xx bodies are kept for the caller but never swapped in
            Ok(response) => {
                warn!("{} answered {}", path, response.status);
                ActionOutcome::ServerError {
                    status: response.status,
                    body: response.body,
                }
            }
            // No retry
            Err(e) => {
                warn!("{} failed: {}", path, e);
                ActionOutcome::NetworkError(e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;

    #[tokio::test]
    async fn vote_fragment_targets_vote_state() {
        let actions = Actions::new(
            FakeTransport::default().respond(VOTE_PATH, 200, "<p>saved</p>"),
            "activity_buttons/",
        );
        let form = vec![("overall".to_string(), "2".to_string())];
        let outcome = actions.submit_vote(&form).await;
        assert_eq!(
            outcome,
            ActionOutcome::Fragment {
                region: Region::VoteState,
                html: "<p>saved</p>".to_string()
            }
        );
        let calls = actions.transport().calls();
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].form, form);
    }

    #[tokio::test]
    async fn comment_region_depends_on_target() {
        let actions = Actions::new(
            FakeTransport::default().respond(COMMENT_PATH, 200, "ok"),
            "activity_buttons/",
        );
        let batch = actions.add_comment("later", CommentTarget::Batch).await;
        assert!(matches!(batch, ActionOutcome::Fragment { region: Region::Messages, .. }));
        let single = actions.add_comment("now", CommentTarget::Proposal).await;
        assert!(matches!(single, ActionOutcome::Fragment { region: Region::Discussion, .. }));
    }

    #[tokio::test]
    async fn failures_are_typed() {
        let actions = Actions::new(
            FakeTransport::default().respond(MARK_READ_PATH, 500, "boom"),
            "activity_buttons/",
        );
        assert_eq!(
            actions.mark_read().await,
            ActionOutcome::ServerError {
                status: 500,
                body: "boom".to_string()
            }
        );
        assert!(matches!(
            actions.toggle_bookmark("/proposals/4/bookmark/").await,
            ActionOutcome::NetworkError(_)
        ));
        assert!(actions.transport().calls()[0].form.is_empty());
    }

    #[tokio::test]
    async fn activity_refresh_is_a_get() {
        let actions = Actions::new(
            FakeTransport::default().respond("activity_buttons/", 200, "<div/>"),
            "activity_buttons/",
        );
        assert!(actions.refresh_activity().await.is_fragment());
        assert_eq!(actions.transport().calls()[0].method, "GET");
    }

    #[test]
    fn http_transport_resolves_relative_paths() {
        let transport = HttpTransport::new("http://localhost:5000/screening/17/").unwrap();
        assert_eq!(
            transport.url(VOTE_PATH).unwrap().as_str(),
            "http://localhost:5000/screening/17/vote/"
        );
        assert!(HttpTransport::new("not a url").is_err());
    }
}
