use axum::{extract::State, Json};
use repository::Repository;
use tracing::debug;

pub mod response;

use self::response::GetEventsResp;

pub async fn get_events(State(repo): State<Repository>) -> Json<GetEventsResp> {
    let events = repo.event.find_all().await;
    debug!(task = "get events", count = events.len());

    Json(events)
}
