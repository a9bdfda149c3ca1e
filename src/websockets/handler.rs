use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{ClientContext, RoomOrchestrator};
use crate::room::types::CreateRoomRequest;
use crate::session::IdentityClaims;
use crate::shared::{AppError, AppState};
use crate::websockets::messages::{
    JoinPrivateRoomPayload, JoinPublicQueuePayload, KickPlayerPayload, MessageType,
    SelectWordPayload, SubmitGuessPayload, WebSocketMessage,
};

use super::socket::{Connection, MessageHandler};

/// Routes client messages to the orchestrator. Request style actions are
/// answered with a RESULT message carrying the action name.
pub struct WebsocketReceiveHandler {
    orchestrator: Arc<RoomOrchestrator>,
}

impl WebsocketReceiveHandler {
    pub fn new(orchestrator: Arc<RoomOrchestrator>) -> Self {
        Self { orchestrator }
    }

    async fn dispatch(
        &self,
        client: &ClientContext,
        message: WebSocketMessage,
    ) -> Result<Option<WebSocketMessage>, AppError> {
        let action = message.message_type;
        let orchestrator = &self.orchestrator;

        match action {
            MessageType::JoinPublicQueue => {
                let payload: JoinPublicQueuePayload = parse(&message)?;
                let username = requested_name(client, payload.display_name);
                let outcome = orchestrator.join_public_queue(client, username).await?;
                reply_with(action, outcome.response())
            }
            MessageType::CreatePrivateRoom => {
                let request: CreateRoomRequest = parse(&message)?;
                let outcome = orchestrator
                    .create_private_room(client, client.username.clone(), &request)
                    .await?;
                reply_with(action, outcome.response())
            }
            MessageType::JoinPrivateRoom => {
                let payload: JoinPrivateRoomPayload = parse(&message)?;
                let outcome = orchestrator
                    .join_by_code(client, client.username.clone(), &payload.room_code)
                    .await?;
                reply_with(action, outcome.response())
            }
            MessageType::LeaveRoom => {
                orchestrator.leave(&client.connection_id).await?;
                Ok(None)
            }
            MessageType::StartGame => {
                orchestrator.start_game_as_host(client).await?;
                Ok(Some(WebSocketMessage::success(action, None)))
            }
            MessageType::KickPlayer => {
                let payload: KickPlayerPayload = parse(&message)?;
                orchestrator.kick(client, payload.player_id).await?;
                Ok(Some(WebSocketMessage::success(action, None)))
            }
            MessageType::RestartGame => {
                orchestrator.restart_game(client).await?;
                Ok(Some(WebSocketMessage::success(action, None)))
            }
            MessageType::CheckRoom => {
                let status = orchestrator.check_player_room(&client.identity).await?;
                reply_with(action, status)
            }
            MessageType::SelectWord => {
                let payload: SelectWordPayload = parse(&message)?;
                orchestrator.select_word(client, &payload.word).await?;
                Ok(None)
            }
            MessageType::SubmitGuess => {
                let payload: SubmitGuessPayload = parse(&message)?;
                orchestrator.submit_guess(client, &payload.text).await?;
                Ok(None)
            }
            MessageType::Draw => {
                orchestrator.relay_draw(client, message.payload).await?;
                Ok(None)
            }
            MessageType::ClearCanvas => {
                orchestrator.clear_canvas(client).await?;
                Ok(None)
            }
            other => Err(AppError::BadRequest(format!(
                "Unsupported message type: {:?}",
                other
            ))),
        }
    }

    async fn reply(&self, client: &ClientContext, message: &WebSocketMessage) {
        self.orchestrator
            .broadcaster()
            .to_connection(&client.connection_id, message)
            .await;
    }
}

fn parse<T: DeserializeOwned>(message: &WebSocketMessage) -> Result<T, AppError> {
    message
        .parse_payload()
        .map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))
}

fn reply_with<T: Serialize>(
    action: MessageType,
    data: T,
) -> Result<Option<WebSocketMessage>, AppError> {
    let data = serde_json::to_value(data).map_err(|_| AppError::Internal)?;
    Ok(Some(WebSocketMessage::success(action, Some(data))))
}

fn requested_name(client: &ClientContext, requested: Option<String>) -> String {
    requested
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| client.username.clone())
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, client: &ClientContext, message: String) {
        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(
                    connection_id = %client.connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.reply(client, &WebSocketMessage::error(format!("Invalid message: {}", e)))
                    .await;
                return;
            }
        };

        let action = ws_message.message_type;
        if action != MessageType::Draw {
            debug!(
                connection_id = %client.connection_id,
                identity = %client.identity,
                message_type = ?action,
                "Received message"
            );
        }

        match self.dispatch(client, ws_message).await {
            Ok(Some(reply)) => self.reply(client, &reply).await,
            Ok(None) => {}
            Err(e) => {
                warn!(
                    connection_id = %client.connection_id,
                    message_type = ?action,
                    error = %e,
                    "Message rejected"
                );
                self.reply(client, &WebSocketMessage::failure(action, e.client_message()))
                    .await;
            }
        }
    }
}

/// WebSocket endpoint that handles authentication via Sec-WebSocket-Protocol header
/// GET /ws with the JWT in the Sec-WebSocket-Protocol header
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let jwt_token = headers
        .get("sec-websocket-protocol")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing or invalid Sec-WebSocket-Protocol header");
            AppError::Unauthorized("Missing authentication token".to_string())
        })?;

    let claims = app_state
        .token_config
        .validate_token(jwt_token)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    info!(
        username = %claims.username,
        "WebSocket authentication successful"
    );

    Ok(ws
        .protocols([jwt_token.to_string()])
        .on_upgrade(move |socket| handle_websocket_connection(socket, claims, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    claims: IdentityClaims,
    app_state: AppState,
) {
    let client = ClientContext {
        connection_id: Uuid::new_v4().to_string(),
        identity: claims.mobile_number.clone(),
        username: claims.display_name(None),
    };

    info!(
        connection_id = %client.connection_id,
        username = %client.username,
        "WebSocket connection established"
    );

    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    app_state
        .connection_manager
        .add_connection(client.connection_id.clone(), outbound_sender)
        .await;

    match app_state.orchestrator.on_connected(&client).await {
        Ok(Some(room)) => info!(
            connection_id = %client.connection_id,
            room_id = room.id,
            "Restored player to room"
        ),
        Ok(None) => {}
        Err(e) => warn!(
            connection_id = %client.connection_id,
            error = %e,
            "Failed to restore player room"
        ),
    }

    let message_handler = Arc::new(WebsocketReceiveHandler::new(Arc::clone(
        &app_state.orchestrator,
    )));
    let connection = Connection::new(
        client.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(
                connection_id = %client.connection_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                connection_id = %client.connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    app_state
        .connection_manager
        .remove_connection(&client.connection_id)
        .await;

    if let Err(e) = app_state
        .orchestrator
        .on_disconnected(&client.connection_id)
        .await
    {
        warn!(
            connection_id = %client.connection_id,
            error = %e,
            "Failed to clean up after disconnect"
        );
    }
}
