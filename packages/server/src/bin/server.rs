//! Hangout room server.
//!
//! Serves the room-coordination WebSocket at `/ws` and the room HTTP API
//! under `/api`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hangout-server
//! cargo run --bin hangout-server -- --host 0.0.0.0 --port 3000 --rooms rooms.json
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use hangout_server::{
    infrastructure::{
        directory::InMemoryRoomDirectory, dto::http::CreateRoomRequest,
        message_pusher::WebSocketMessagePusher,
    },
    ui::{Server, state::AppState},
    usecase::{
        CreateRoomUseCase, DeleteRoomUseCase, EventBroadcaster, GetActiveSessionsUseCase,
        GetRoomDetailUseCase, NewRoom, RoomRegistry,
    },
};
use hangout_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hangout-server")]
#[command(about = "Room coordination server for ephemeral chatrooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,

    /// JSON file with rooms to create at startup
    #[arg(long)]
    rooms: Option<PathBuf>,
}

/// Create the rooms listed in the preload file.
async fn preload_rooms(
    path: &Path,
    create_room_usecase: &CreateRoomUseCase,
) -> Result<usize, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let requests: Vec<CreateRoomRequest> = serde_json::from_str(&content)?;

    let mut created = 0;
    for request in requests {
        let input = NewRoom {
            room_id: request.room_id,
            room_name: request.room_name,
            description: request.description,
            host_id: request.host_id,
            allow_uploads: request.allow_images,
            duration_minutes: request.duration_minutes,
            max_participants: request.max_participants,
        };
        let record = create_room_usecase.execute(input).await?;
        tracing::info!("Preloaded room '{}' ({})", record.room_id, record.room_name);
        created += 1;
    }
    Ok(created)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Room Directory and clock
    // 2. MessagePusher and EventBroadcaster
    // 3. Room Registry
    // 4. UseCases
    // 5. Server

    // 1. Room Directory (in-memory)
    let directory = Arc::new(InMemoryRoomDirectory::new());
    let clock = Arc::new(SystemClock);

    // 2. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let broadcaster = EventBroadcaster::new(message_pusher.clone());

    // 3. Room Registry
    let registry = RoomRegistry::new(directory.clone(), clock.clone(), broadcaster.clone());

    // 4. UseCases
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(directory.clone(), clock));
    let get_room_detail_usecase =
        Arc::new(GetRoomDetailUseCase::new(directory.clone(), registry.clone()));
    let get_active_sessions_usecase = Arc::new(GetActiveSessionsUseCase::new(registry.clone()));
    let delete_room_usecase = Arc::new(DeleteRoomUseCase::new(
        directory.clone(),
        registry.clone(),
        broadcaster.clone(),
    ));

    if let Some(path) = &args.rooms {
        match preload_rooms(path, &create_room_usecase).await {
            Ok(count) => tracing::info!("{} room(s) preloaded from {}", count, path.display()),
            Err(e) => {
                tracing::error!("Failed to preload rooms from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    // 5. Create and run the server
    let server = Server::new(AppState {
        registry,
        broadcaster,
        message_pusher,
        create_room_usecase,
        get_room_detail_usecase,
        get_active_sessions_usecase,
        delete_room_usecase,
    });
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
