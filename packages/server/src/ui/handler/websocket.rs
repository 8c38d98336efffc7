//! WebSocket connection handlers.
//!
//! 1 接続につき 1 つの `ConnectionHandler` を作り、受信したフレームを
//! `ConnectionEvents` に振り分けます。送信は MessagePusher に登録した
//! チャンネル経由で `pusher_loop` が行います。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, Stream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::{ConnectionEvents, ConnectionHandler, HandlerError, JoinRequest, MessageRequest},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    let connection_id = ConnectionIdFactory::generate().map_err(|e| {
        tracing::error!("Failed to generate connection id: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id)))
}

/// Spawns a task that forwards queued events to the WebSocket sink.
///
/// Ends when the channel closes or the client stops accepting frames.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    let (sender, receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_client(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' opened", connection_id);

    let mut handler = ConnectionHandler::new(
        connection_id.clone(),
        state.registry.clone(),
        state.broadcaster.clone(),
    );
    let mut send_task = pusher_loop(rx, sender);

    receive_loop(receiver, &mut handler, &mut send_task, &connection_id).await;
    send_task.abort();

    handler.on_disconnect().await;
    state.message_pusher.unregister_client(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}

/// Feeds incoming frames to the handler until either half of the socket ends.
///
/// Only the wait for the next frame races the send task. A frame that has
/// been received is always dispatched to completion.
async fn receive_loop<S, H>(
    mut receiver: S,
    handler: &mut H,
    send_task: &mut JoinHandle<()>,
    connection_id: &ConnectionId,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    H: ConnectionEvents,
{
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut *send_task => {
                tracing::info!("Outbound stream of connection '{}' ended", connection_id);
                break;
            }
        };

        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::error!("WebSocket error on connection '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                if let Err(e) = dispatch(handler, text.as_str()).await {
                    handler.report(&e).await;
                }
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            Message::Binary(_) => {
                tracing::warn!("Ignoring binary frame from connection '{}'", connection_id);
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}

/// Decode one text frame and hand it to the connection's state machine.
async fn dispatch<H: ConnectionEvents>(handler: &mut H, text: &str) -> Result<(), HandlerError> {
    let message = serde_json::from_str::<ClientMessage>(text)
        .map_err(|e| HandlerError::Malformed(e.to_string()))?;

    match message {
        ClientMessage::JoinRoom {
            room_id,
            user_name,
            user_id,
        } => {
            handler
                .on_join(JoinRequest {
                    room_id,
                    user_name,
                    user_id,
                })
                .await
        }
        ClientMessage::SendMessage {
            room_id,
            message,
            image_url,
            timestamp,
            ..
        } => {
            handler
                .on_message(MessageRequest {
                    room_id,
                    message,
                    image_url,
                    timestamp,
                })
                .await
        }
        ClientMessage::LeaveRoom { room_id, .. } => handler.on_leave(room_id).await,
        ClientMessage::CloseSession { room_id } => handler.on_close(room_id).await,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures_util::stream;
    use tokio::sync::oneshot;

    use super::*;

    /// 受け取ったイベントを記録するだけの ConnectionEvents
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        /// 設定されていれば、参加処理の途中で開始を通知し、解放されるまで待つ
        join_gate: Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>,
    }

    #[async_trait]
    impl ConnectionEvents for Recorder {
        async fn on_join(&mut self, request: JoinRequest) -> Result<(), HandlerError> {
            self.events.push(format!(
                "join {} {} {:?}",
                request.room_id, request.user_name, request.user_id
            ));
            if let Some((started, release)) = self.join_gate.take() {
                let _ = started.send(());
                let _ = release.await;
                self.events.push("join finished".to_string());
            }
            Ok(())
        }

        async fn on_message(&mut self, request: MessageRequest) -> Result<(), HandlerError> {
            self.events
                .push(format!("message {} {}", request.room_id, request.message));
            Ok(())
        }

        async fn on_leave(&mut self, room_id: String) -> Result<(), HandlerError> {
            self.events.push(format!("leave {}", room_id));
            Ok(())
        }

        async fn on_close(&mut self, room_id: String) -> Result<(), HandlerError> {
            self.events.push(format!("close {}", room_id));
            Ok(())
        }

        async fn on_disconnect(&mut self) {
            self.events.push("disconnect".to_string());
        }

        async fn report(&self, _error: &HandlerError) {}
    }

    fn text_frame(frame: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(frame.to_string().into()))
    }

    #[tokio::test]
    async fn test_dispatch_routes_each_event() {
        // テスト項目: 各イベント種別が対応するハンドラに渡される
        // given (前提条件):
        let mut recorder = Recorder::default();
        let frames = [
            r#"{"type":"joinRoom","roomId":"HANGOUT-ab12cd","userName":"alice","userId":"u1"}"#,
            r#"{"type":"sendMessage","roomId":"HANGOUT-ab12cd","userName":"alice","message":"hi"}"#,
            r#"{"type":"leaveRoom","roomId":"HANGOUT-ab12cd","userName":"alice"}"#,
            r#"{"type":"closeSession","roomId":"HANGOUT-ab12cd"}"#,
        ];

        // when (操作):
        for frame in frames {
            dispatch(&mut recorder, frame).await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(
            recorder.events,
            vec![
                r#"join HANGOUT-ab12cd alice Some("u1")"#.to_string(),
                "message HANGOUT-ab12cd hi".to_string(),
                "leave HANGOUT-ab12cd".to_string(),
                "close HANGOUT-ab12cd".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejects_malformed_frames() {
        // テスト項目: 解釈できないフレームは Malformed になり、ハンドラは呼ばれない
        // given (前提条件):
        let mut recorder = Recorder::default();

        // when (操作):
        let not_json = dispatch(&mut recorder, "hello").await;
        let unknown = dispatch(&mut recorder, r#"{"type":"dance"}"#).await;

        // then (期待する結果):
        assert!(matches!(not_json, Err(HandlerError::Malformed(_))));
        assert!(matches!(unknown, Err(HandlerError::Malformed(_))));
        assert!(recorder.events.is_empty());
    }

    #[tokio::test]
    async fn test_receive_loop_finishes_dispatch_when_send_side_ends() {
        // テスト項目: 処理中に送信側が終わっても、受信済みのイベントは最後まで処理される
        // given (前提条件):
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut recorder = Recorder {
            join_gate: Some((started_tx, release_rx)),
            ..Default::default()
        };
        let frames = stream::iter(vec![text_frame(
            r#"{"type":"joinRoom","roomId":"HANGOUT-ab12cd","userName":"alice"}"#,
        )])
        .chain(stream::pending());
        let mut send_task = tokio::spawn(async move {
            let _ = stop_rx.await;
        });
        let receiving = tokio::spawn(async move {
            let connection_id = ConnectionId::new("c1".to_string()).unwrap();
            receive_loop(frames, &mut recorder, &mut send_task, &connection_id).await;
            recorder
        });

        // when (操作):
        started_rx.await.unwrap();
        stop_tx.send(()).unwrap();
        tokio::task::yield_now().await;
        release_tx.send(()).unwrap();

        // then (期待する結果):
        let recorder = receiving.await.unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "join HANGOUT-ab12cd alice None".to_string(),
                "join finished".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_receive_loop_stops_on_close_frame() {
        // テスト項目: Close フレームを受け取ると、それ以降のフレームは処理しない
        // given (前提条件):
        let mut recorder = Recorder::default();
        let frames = stream::iter(vec![
            text_frame(r#"{"type":"closeSession","roomId":"HANGOUT-ab12cd"}"#),
            Ok(Message::Close(None)),
            text_frame(r#"{"type":"leaveRoom","roomId":"HANGOUT-ab12cd"}"#),
        ]);
        let mut send_task = tokio::spawn(std::future::pending::<()>());
        let connection_id = ConnectionId::new("c1".to_string()).unwrap();

        // when (操作):
        receive_loop(frames, &mut recorder, &mut send_task, &connection_id).await;
        send_task.abort();

        // then (期待する結果):
        assert_eq!(recorder.events, vec!["close HANGOUT-ab12cd".to_string()]);
    }
}
