use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use entity::prelude::*;
use repository::Repository;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

pub mod request;
pub mod response;

use self::{
    request::{PullRequestPayload, PushPayload},
    response::MessageResp,
};
use crate::response::{ApiError, ApiResponse, IntoApiResponse};

const GITHUB_EVENT_HEADER: &str = "X-GitHub-Event";
const REF_PREFIXES: [&str; 2] = ["refs/heads/", "refs/tags/"];

pub async fn post_webhook(
    State(repo): State<Repository>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse<Json<MessageResp>> {
    let event_type = headers
        .get(GITHUB_EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    debug!(task = "receive webhook", event_type, size = body.len());

    let event = match event_type {
        "ping" => return Ok(MessageResp::json("Ping received")),
        "push" => push_event(parse::<PushPayload>(&body)?),
        "pull_request" => {
            pull_request_event(parse::<PullRequestPayload>(&body)?)?
        }
        _ => {
            error!(task = "receive webhook", event_type, err = "invalid event type");
            return Err(ApiError::ClientError("Invalid event type".to_string()));
        }
    };

    let Some(event) = event else {
        debug!(task = "ignore webhook", event_type);
        return Ok(MessageResp::json("Event ignored"));
    };

    debug!(task = "store event", model = format!("{:?}", event));
    repo.event.save(event).await;

    Ok(MessageResp::json("Event processed"))
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> ApiResponse<T> {
    serde_json::from_slice::<T>(body).into_response("failed to parse payload")
}

/// Deleted refs carry no head commit and produce nothing.
pub fn push_event(payload: PushPayload) -> Option<EventEntity> {
    let head_commit = payload.head_commit?;

    Some(EventEntity {
        request_id: Some(head_commit.id),
        action: EventAction::Push,
        author: payload.pusher.name,
        to_branch: branch_name(&payload.git_ref).to_string(),
        from_branch: None,
        timestamp: Timestamp::Text(head_commit.timestamp),
    })
}

/// Opened pull requests and merged closes; every other action is ignored.
pub fn pull_request_event(
    payload: PullRequestPayload,
) -> ApiResponse<Option<EventEntity>> {
    let pull_request = payload.pull_request;

    let (action, timestamp) = match payload.action.as_str() {
        "opened" => (EventAction::PullRequest, pull_request.created_at),
        "closed" if pull_request.merged => (
            EventAction::Merge,
            pull_request
                .merged_at
                .into_response("merged pull request has no merged_at")?,
        ),
        _ => return Ok(None),
    };

    Ok(Some(EventEntity {
        request_id: Some(pull_request.id.to_string()),
        action,
        author: pull_request.user.login,
        to_branch: pull_request.base.name,
        from_branch: Some(pull_request.head.name),
        timestamp: Timestamp::Text(timestamp),
    }))
}

fn branch_name(git_ref: &str) -> &str {
    REF_PREFIXES
        .iter()
        .find_map(|prefix| git_ref.strip_prefix(prefix))
        .unwrap_or(git_ref)
}
