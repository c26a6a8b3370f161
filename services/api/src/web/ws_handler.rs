//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a viewer's WebSocket
//! connection. Client requests and store change notifications are handled on
//! the same loop, one at a time, against the connection's `SessionState`.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, SessionState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use document_viewer_core::domain::ChangeEvent;
use document_viewer_core::ports::{PortError, PortResult};
use document_viewer_core::viewer::FollowUp;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}

async fn send_all(
    sender: &mut SplitSink<WebSocket, Message>,
    messages: &[ServerMessage],
) -> Result<(), axum::Error> {
    for message in messages {
        send_message(sender, message).await?;
    }
    Ok(())
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New viewer connection established.");
    let (mut sender, mut receiver) = socket.split();

    // --- 1. Initialization Phase ---
    let (requested, language) = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Init {
                document_id,
                language,
            }) => (document_id, language.unwrap_or_default()),
            _ => {
                error!("First message was not a valid Init message.");
                let _ = send_message(
                    &mut sender,
                    &ServerMessage::Error {
                        message: "The first message must be 'init'.".to_string(),
                    },
                )
                .await;
                return;
            }
        },
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    // Subscribe before loading so no change between the two is missed.
    let mut changes = app_state.store.subscribe();

    let (mut session, failures) = SessionState::new(&app_state, requested, language).await;
    let mut messages = vec![ServerMessage::SessionInitialized { language }];
    messages.extend(failures.iter().map(error_message));
    messages.push(session.library_message());
    messages.push(session.view_message());
    if send_all(&mut sender, &messages).await.is_err() {
        error!("Failed to send session initialization messages.");
        return;
    }

    // --- 2. Main Event Loop ---
    loop {
        let outgoing = tokio::select! {
            _ = app_state.shutdown.cancelled() => {
                info!("Server shutting down; closing viewer connection.");
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => handle_client_message(&app_state, &mut session, message).await,
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        vec![ServerMessage::Error { message: format!("Invalid message: {}", e) }]
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Viewer disconnected.");
                    break;
                }
                Some(Ok(_)) => Vec::new(),
                Some(Err(e)) => {
                    error!("WebSocket receive error: {:?}", e);
                    break;
                }
            },
            change = changes.next() => match change {
                Some(event) => handle_change(&app_state, &mut session, event).await,
                None => {
                    warn!("Document change feed closed.");
                    break;
                }
            },
        };

        if send_all(&mut sender, &outgoing).await.is_err() {
            error!("Failed to send messages to viewer. Closing connection.");
            break;
        }
    }
}

fn error_message(error: &PortError) -> ServerMessage {
    ServerMessage::Error {
        message: error.to_string(),
    }
}

/// Acts on a library follow-up, fetching a replacement document if needed.
async fn follow_up(
    app_state: &AppState,
    session: &mut SessionState,
    follow_up: FollowUp,
) -> Vec<ServerMessage> {
    match follow_up {
        FollowUp::Nothing => vec![session.library_message()],
        FollowUp::Rerender | FollowUp::ShowEmpty => {
            vec![session.library_message(), session.view_message()]
        }
        FollowUp::Open(mut next) => {
            let mut messages = Vec::new();
            // Each missing document is dropped from the library, so this ends.
            while let Err(e) = session.open(app_state, next).await {
                error!("Failed to open document {}: {:?}", next, e);
                messages.push(error_message(&e));
                let retry = match e {
                    PortError::NotFound(_) => session.viewer.remove_document(next),
                    _ => FollowUp::ShowEmpty,
                };
                match retry {
                    FollowUp::Open(other) => next = other,
                    _ => {
                        session.viewer.close();
                        break;
                    }
                }
            }
            messages.push(session.library_message());
            messages.push(session.view_message());
            messages
        }
    }
}

/// Applies a store change notification to the session.
pub async fn handle_change(
    app_state: &AppState,
    session: &mut SessionState,
    event: ChangeEvent,
) -> Vec<ServerMessage> {
    debug!("Applying document change for {}", event.document_id());
    let next = session.viewer.apply_change(event);
    follow_up(app_state, session, next).await
}

/// Handles one client request and returns the messages to send back.
pub async fn handle_client_message(
    app_state: &AppState,
    session: &mut SessionState,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    match dispatch(app_state, session, message).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!("Viewer request failed: {}", e);
            vec![error_message(&e)]
        }
    }
}

async fn dispatch(
    app_state: &AppState,
    session: &mut SessionState,
    message: ClientMessage,
) -> PortResult<Vec<ServerMessage>> {
    let messages = match message {
        ClientMessage::Init { .. } => {
            return Err(PortError::Validation(
                "Session is already initialized.".to_string(),
            ))
        }
        ClientMessage::SelectDocument { document_id } => {
            session.open(app_state, document_id).await?;
            vec![session.library_message(), session.view_message()]
        }
        ClientMessage::DeleteDocument { document_id } => {
            app_state.store.delete_document(document_id).await?;
            info!("Deleted document {}", document_id);
            let next = session.viewer.remove_document(document_id);
            follow_up(app_state, session, next).await
        }
        ClientMessage::SetLanguage { language } => {
            session.viewer.set_language(language);
            vec![session.view_message()]
        }
        ClientMessage::ToggleSection { key } => {
            let state = session.viewer.toggle_section(&key)?;
            vec![ServerMessage::SectionToggled { key, state }]
        }
        ClientMessage::SelectSubtopic { parent, key } => {
            let state = session.viewer.select_subtopic(&parent, &key)?;
            vec![ServerMessage::SubtopicSelected { parent, key, state }]
        }
        ClientMessage::ToggleDescription { key } => {
            let open = session.viewer.toggle_description(&key)?;
            vec![ServerMessage::DescriptionToggled { key, open }]
        }
        ClientMessage::Progress {
            key,
            position,
            duration,
        } => match session.viewer.record_progress(&key, position, duration)? {
            Some(status) => {
                info!("Listening status of '{}' is now {:?}", key, status);
                vec![ServerMessage::StatusChanged { key, status }]
            }
            None => Vec::new(),
        },
    };
    Ok(messages)
}
