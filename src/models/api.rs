use serde::{ Serialize, Deserialize };
use super::chat::Message;

#[derive(Serialize, Deserialize, Debug)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user_message: Message,
    pub assistant_message: Message,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
}
