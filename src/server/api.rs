use crate::agent::{ AgentError, ChatAgent };
use crate::history::StoreError;
use crate::models::api::{ ChatExchange, ErrorResponse, HealthResponse, SendMessageRequest };
use crate::models::chat::NewConversation;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ State, Path },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use tower_http::cors::{ Any, CorsLayer };
use log::{ debug, error };

#[derive(Clone)]
struct AppState {
    agent: ChatAgent,
}

pub fn router(agent: ChatAgent) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/conversations", post(create_conversation_handler))
        .route("/api/conversations/{id}", get(get_conversation_handler))
        .route(
            "/api/conversations/{id}/messages",
            get(list_messages_handler).post(send_message_handler)
        )
        .route("/api/messages/{id}", get(get_message_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(ErrorResponse { message: message.into() })).into_response()
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let code = match &self {
            AgentError::ConversationNotFound(_) | AgentError::MessageNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AgentError::Store(StoreError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AgentError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if code.is_server_error() {
            error!("Request failed: {}", self);
        }
        error_response(code, self.to_string())
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

async fn create_conversation_handler(
    State(state): State<AppState>,
    body: Option<Json<NewConversation>>
) -> Result<Response, AgentError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let conversation = state.agent.create_conversation(request).await?;
    Ok((StatusCode::CREATED, Json(conversation)).into_response())
}

async fn get_conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>
) -> Result<Response, AgentError> {
    match state.agent.get_conversation(id).await? {
        Some(conversation) => Ok(Json(conversation).into_response()),
        None => Err(AgentError::ConversationNotFound(id)),
    }
}

async fn list_messages_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>
) -> Result<Response, AgentError> {
    let messages = state.agent.conversation_messages(id).await?;
    Ok(Json(messages).into_response())
}

async fn send_message_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<SendMessageRequest>
) -> Result<Response, AgentError> {
    debug!("Chat request for conversation {} ({} chars)", id, req.content.len());
    let turn = state.agent.process_message(id, &req.content).await?;
    Ok(
        Json(ChatExchange {
            user_message: turn.user_message,
            assistant_message: turn.assistant_message,
        }).into_response()
    )
}

async fn get_message_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>
) -> Result<Response, AgentError> {
    let message = state.agent.get_message(id).await?;
    Ok(Json(message).into_response())
}
