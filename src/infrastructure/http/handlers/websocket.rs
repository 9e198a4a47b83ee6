//! WebSocket Handlers
//!
//! - `/ws/feed/:feed_id`：单个信息流的状态推送，连接后先发送一次当前视图
//! - `/ws/events`：全局作品事件（发布、点赞、导入）

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 信息流 WebSocket 连接处理
pub async fn feed_websocket_handler(
    ws: WebSocketUpgrade,
    Path(feed_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_feed_socket(socket, feed_id, state))
}

/// 全局 WebSocket 连接处理
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_global_socket(socket, state))
}

fn encode(event: &WsEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_feed_socket(socket: WebSocket, feed_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let snapshot = match state.feed_store.snapshot(&feed_id) {
        Ok(snapshot) => snapshot,
        Err(_) => {
            tracing::warn!(feed_id = %feed_id, "WebSocket connection rejected: unknown feed");
            let _ = sender.close().await;
            return;
        }
    };

    // 先注册再发送初始视图，避免漏掉中间的更新
    let mut event_rx = state.event_publisher.register_feed(&feed_id);
    tracing::info!(feed_id = %feed_id, "Feed WebSocket connected");

    let initial = WsEvent::FeedUpdated {
        feed_id: feed_id.clone(),
        snapshot: Box::new(snapshot),
    };
    if let Some(msg) = encode(&initial) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    let feed_id_for_forward = feed_id.clone();
    let forward_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            let closed = matches!(event, WsEvent::FeedClosed { .. });
            let Some(msg) = encode(&event) else {
                continue;
            };
            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    feed_id = %feed_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
            if closed {
                let _ = sender.close().await;
                break;
            }
        }
    });

    let feed_id_for_receive = feed_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(feed_id = %feed_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(feed_id = %feed_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    // 信息流本身保留，空闲超时后由后台任务清理
    tracing::info!(feed_id = %feed_id, "Feed WebSocket disconnected");
}

async fn handle_global_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_publisher.subscribe_global();

    tracing::info!("Global WebSocket connected");

    let forward_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match &event {
                WsEvent::NovelPublished { .. }
                | WsEvent::NovelLiked { .. }
                | WsEvent::NovelImported { .. } => {
                    let Some(msg) = encode(&event) else {
                        continue;
                    };
                    if let Err(e) = sender.send(msg).await {
                        tracing::debug!(error = %e, "Failed to send global WebSocket message");
                        break;
                    }
                }
                _ => {}
            }
        }
    });

    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Global WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Global WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Global WebSocket disconnected");
}
