//! Realtime relay over WebSocket connections.
//!
//! Each connection registers an unbounded outbound queue. Replies to a
//! client's own messages and broadcasts from the HTTP surface both flow
//! through that queue into the socket writer task.

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rocket::{State, get};
use rocket_ws::{Channel, Message, WebSocket};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;
use worldhud_core::{
    HudError, HudService, RecognitionRecord, RecognitionRequest, TranslationRecord,
    TranslationRequest,
};

pub type ConnectionId = Uuid;

/// Messages pushed to realtime clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    TranslationResult { payload: TranslationRecord },
    RecognitionResult { payload: RecognitionRecord },
    Pong { timestamp: DateTime<Utc> },
}

/// Inbound `{type, payload}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Registry of live realtime connections.
#[derive(Clone, Default)]
pub struct Relay {
    connections: Arc<Mutex<HashMap<ConnectionId, UnboundedSender<String>>>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its queue.
    pub fn register(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut connections = self.connections.lock();
        connections.insert(id, sender);
        info!(
            "realtime client connected (id={id}, active={})",
            connections.len()
        );
        (id, receiver)
    }

    /// Remove a connection. Unknown ids are ignored.
    pub fn unregister(&self, id: ConnectionId) {
        let mut connections = self.connections.lock();
        if connections.remove(&id).is_some() {
            info!(
                "realtime client disconnected (id={id}, active={})",
                connections.len()
            );
        }
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Queue a message for one connection. Returns false if it is gone.
    pub fn send(&self, id: ConnectionId, message: &OutboundMessage) -> bool {
        let Some(text) = encode(message) else {
            return false;
        };
        let delivered = self
            .connections
            .lock()
            .get(&id)
            .is_some_and(|sender| sender.send(text).is_ok());
        if !delivered {
            debug!("dropping reply for closed connection (id={id})");
            self.unregister(id);
        }
        delivered
    }

    /// Queue a message for every connection and return how many accepted it.
    ///
    /// Connections whose queue is closed are removed from the registry.
    pub fn broadcast(&self, message: &OutboundMessage) -> usize {
        let Some(text) = encode(message) else {
            return 0;
        };
        let (attempted, dead): (usize, Vec<ConnectionId>) = {
            let connections = self.connections.lock();
            let dead = connections
                .iter()
                .filter(|(_, sender)| sender.send(text.clone()).is_err())
                .map(|(id, _)| *id)
                .collect();
            (connections.len(), dead)
        };
        for id in &dead {
            warn!("broadcast failed, dropping connection (id={id})");
            self.unregister(*id);
        }
        let delivered = attempted - dead.len();
        debug!("broadcast delivered (recipients={delivered}, dropped={})", dead.len());
        delivered
    }
}

fn encode(message: &OutboundMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("failed to encode realtime message: {err}");
            None
        }
    }
}

fn parse_payload<T: for<'de> Deserialize<'de>>(
    kind: &str,
    payload: Value,
) -> Result<T, HudError> {
    serde_json::from_value(payload)
        .map_err(|err| HudError::Validation(format!("invalid `{kind}` payload: {err}")))
}

/// Handle one inbound text frame and produce the reply, if any.
///
/// Unknown message types are ignored.
pub async fn dispatch(
    service: &HudService,
    text: &str,
) -> Result<Option<OutboundMessage>, HudError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|err| HudError::Validation(format!("malformed realtime message: {err}")))?;
    match envelope.kind.as_str() {
        "translate" => {
            let request: TranslationRequest = parse_payload(&envelope.kind, envelope.payload)?;
            let record = service.translate(request).await?;
            Ok(Some(OutboundMessage::TranslationResult { payload: record }))
        }
        "recognize" => {
            let request: RecognitionRequest = parse_payload(&envelope.kind, envelope.payload)?;
            let record = service.recognize(request).await?;
            Ok(Some(OutboundMessage::RecognitionResult { payload: record }))
        }
        "ping" => Ok(Some(OutboundMessage::Pong {
            timestamp: Utc::now(),
        })),
        other => {
            debug!("ignoring realtime message (type={other})");
            Ok(None)
        }
    }
}

#[get("/ws/hud")]
pub fn hud_socket(
    ws: WebSocket,
    service: &State<HudService>,
    relay: &State<Relay>,
) -> Channel<'static> {
    let service = service.inner().clone();
    let relay = relay.inner().clone();
    ws.channel(move |stream| {
        Box::pin(async move {
            let (connection_id, mut outbound) = relay.register();
            let (mut sink, mut source) = stream.split();

            let writer = tokio::spawn(async move {
                while let Some(text) = outbound.recv().await {
                    if let Err(err) = sink.send(Message::Text(text.into())).await {
                        debug!("realtime send failed (id={connection_id}): {err}");
                        break;
                    }
                }
                let _ = sink.close().await;
            });

            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!("realtime receive failed (id={connection_id}): {err}");
                        break;
                    }
                };
                match dispatch(&service, &text).await {
                    Ok(Some(reply)) => {
                        if !relay.send(connection_id, &reply) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!("closing realtime connection (id={connection_id}): {err}");
                        break;
                    }
                }
            }

            relay.unregister(connection_id);
            let _ = writer.await;
            Ok(())
        })
    })
}
