use axum::Json;
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq)]
pub struct MessageResp {
    pub message: String,
}

impl MessageResp {
    pub fn json(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}
