use entity::prelude::*;

/// `GET /events` body: a bare JSON array in insertion order.
pub type GetEventsResp = Vec<EventEntity>;
