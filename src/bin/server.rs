use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use river_raid_server::command::{parse_command, CommandHandler};
use river_raid_server::config::WorldArgs;
use river_raid_server::constants::TICK_MS;
use river_raid_server::game_state::GameState;
use river_raid_server::logging;
use river_raid_server::pool::EntityPool;
use river_raid_server::ticker::Ticker;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
    #[arg(long, env = "RIVER_RAID_SEED")]
    seed: Option<u32>,
    #[command(flatten)]
    world: WorldArgs,
}

type SharedState = Arc<AppState>;

struct AppState {
    game: Arc<GameState>,
    commands: CommandHandler,
    clients: Mutex<HashMap<String, ClientContext>>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();
    let config = cli.world.into_config();
    let game = Arc::new(GameState::new(config.clone()));
    let pool = Arc::new(EntityPool::new(&config));
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let ticker = Ticker::new(Arc::clone(&game), Arc::clone(&pool), config, seed);

    let state = Arc::new(AppState {
        commands: CommandHandler::new(Arc::clone(&game), pool),
        game,
        clients: Mutex::new(HashMap::new()),
    });
    start_tick_loop(state.clone(), ticker);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/state", get(state_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(cli.static_dir) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.to_string_lossy(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        app
    };

    let bind_addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    info!(port = cli.port, seed, "river raid server listening");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path);
        }
        warn!(path = %path.to_string_lossy(), "static dir has no index.html, ignoring");
    }
    let candidates = [PathBuf::from("client"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn state_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.game.snapshot())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut clients = state.clients.lock().await;
        clients.insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_to_client(
            &mut clients,
            &client_id,
            &json!({
                "type": "welcome",
                "clientId": client_id,
                "game_state": state.game.snapshot(),
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
    info!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(&state, &client_id, &text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.clients.lock().await.remove(&client_id);
    info!(client = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let command = match parse_command(raw) {
        Ok(command) => command,
        Err(err) => {
            warn!(client = %client_id, error = %err, "rejected client message");
            send_error_to_client(state, client_id, &err.to_string()).await;
            return;
        }
    };

    // The game lock is taken and dropped inside `handle`; nothing is held
    // across the await below.
    let snapshot = state.commands.handle(command);
    let mut clients = state.clients.lock().await;
    send_to_client(
        &mut clients,
        client_id,
        &json!({
            "type": "state",
            "game_state": snapshot,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn start_tick_loop(state: SharedState, mut ticker: Ticker) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let outcome = ticker.tick();
            let snapshot = state.game.snapshot();

            let mut clients = state.clients.lock().await;
            broadcast(
                &mut clients,
                &json!({
                    "type": "state",
                    "game_state": snapshot,
                }),
                QueuePolicy::DropOnFull,
            );
            if outcome.collisions.game_over {
                info!(score = snapshot.score, tick = snapshot.tick, "broadcasting game over");
                broadcast(
                    &mut clients,
                    &json!({
                        "type": "game_over",
                        "score": snapshot.score,
                    }),
                    QueuePolicy::DisconnectOnFull,
                );
            }
        }
    });
}

fn send_to_client(
    clients: &mut HashMap<String, ClientContext>,
    client_id: &str,
    message: &Value,
    policy: QueuePolicy,
) {
    let send_failed = if let Some(client) = clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(clients, client_id);
    }
}

fn broadcast(clients: &mut HashMap<String, ClientContext>, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in clients.iter() {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(clients, &client_id);
    }
}

fn disconnect_client(clients: &mut HashMap<String, ClientContext>, client_id: &str) {
    if let Some(client) = clients.remove(client_id) {
        warn!(client = %client_id, "outbound queue full, disconnecting");
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1013,
            reason: "outbound queue full".to_string(),
        });
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut clients = state.clients.lock().await;
    send_to_client(
        &mut clients,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
