use log::{error, info, warn};
use std::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use trusty_review::config::Config;
use trusty_review::draft::DraftStore;
use trusty_review::handlers::UiEvent;
use trusty_review::handlers::actions::{ActionOutcome, Actions, CommentTarget, HttpTransport};
use trusty_review::models::PageConfig;
use trusty_review::ReviewPage;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn report(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Fragment { region, .. } => info!("Updated #{}", region.element_id()),
        ActionOutcome::ServerError { status, .. } => warn!("Server answered {}", status),
        ActionOutcome::NetworkError(e) => warn!("Request failed: {}", e),
    }
}

async fn handle_line(
    page: &mut ReviewPage,
    actions: &Actions<HttpTransport>,
    line: &str,
) -> Result<(), BoxError> {
    // First word is the command, the rest is free text for the input commands
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "show" => println!("{}", serde_json::to_string_pretty(&page.view())?),
        "rows" => println!("{}", page.render_selected()?),
        "reason" => {
            page.dispatch(UiEvent::ReasonInput(rest.to_string()));
        }
        "feedback" => {
            page.dispatch(UiEvent::FeedbackInput(rest.to_string()));
        }
        "comment" => {
            page.dispatch(UiEvent::CommentInput(rest.to_string()));
        }
        "submit" => match page.submit_vote(actions).await {
            Some(outcome) => report(&outcome),
            None => warn!("Vote is incomplete, submit is disabled"),
        },
        "mark-read" => report(&page.mark_read(actions).await),
        "send-feedback" => report(&page.send_feedback(actions).await),
        "send-comment" => report(&page.add_comment(actions, CommentTarget::Proposal).await),
        "queue-comment" => report(&page.add_comment(actions, CommentTarget::Batch).await),
        "bookmark" => report(&page.toggle_bookmark(actions, rest).await),
        // Anything else is treated as a clicked control id
        control_id => {
            if !page.click(control_id) {
                info!("{} changed nothing", control_id);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env if present, then initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env();
    let raw = fs::read_to_string(config.page_config_path()?)?;
    let page_config = PageConfig::from_json(&raw)?;

    // Drafts land in REVIEW_DRAFT_DIR, or stay in memory without it
    let drafts: DraftStore = config.draft_store()?;
    let mut page = ReviewPage::attach(page_config, drafts)?;
    let actions = Actions::new(HttpTransport::new(&config.base_url)?, config.activity_path.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = handle_line(&mut page, &actions, line).await {
            error!("{}: {}", line, e);
        }
    }
    Ok(())
}
