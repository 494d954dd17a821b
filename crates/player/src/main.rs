//! Vade Mecum Player - joins a session and follows its push events.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vademecum_player::infrastructure::{
    CacheUpdate, ConnectionManager, HttpStore, SessionCache, TungsteniteTransport,
};
use vademecum_player::ports::outbound::StorePort;
use vademecum_player::{PlayerConfig, SessionService};

const NEW_SESSION_NAME: &str = "New session";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vademecum_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vade Mecum Player");

    let config = PlayerConfig::from_env()?;

    let store: Arc<dyn StorePort> = Arc::new(HttpStore::new(&config.api_url, config.user_id));
    let cache = Arc::new(SessionCache::new());
    let transport = Arc::new(TungsteniteTransport::new(config.ws_url.clone(), config.user_id));
    let connection = ConnectionManager::new(transport, Arc::clone(&cache))
        .with_heartbeat_interval(config.heartbeat_interval);
    let sessions = SessionService::new(store, cache, connection);

    let session_id = match config.session_id {
        Some(id) => id,
        None => {
            let session = sessions.create_session(NEW_SESSION_NAME).await?;
            tracing::info!(session_id = %session.id, "No session configured, created one");
            session.id
        }
    };

    // Pull the views we follow so push events have something to merge into.
    let rolls = sessions.rolls(session_id).await?;
    let characters = sessions.characters(session_id).await?;
    let encounters = sessions.encounters(session_id).await?;
    tracing::info!(
        session_id = %session_id,
        rolls = rolls.len(),
        characters = characters.len(),
        encounters = encounters.len(),
        "Loaded session"
    );

    let mut updates = sessions.subscribe_updates();
    let mut state = sessions.subscribe_state();
    sessions.connect(session_id).await?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                tracing::info!(state = ?current, "Connection state changed");
            }
            update = updates.recv() => match update {
                Ok(update) => log_update(&sessions, update).await,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed cache updates");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    sessions.disconnect().await;
    Ok(())
}

async fn log_update(sessions: &SessionService, update: CacheUpdate) {
    match update {
        CacheUpdate::Rolls { session_id } => match sessions.rolls(session_id).await {
            Ok(rolls) => match rolls.first() {
                Some(latest) => tracing::info!(
                    label = %latest.label,
                    dice = ?latest.dice,
                    result = latest.result(),
                    "Roll"
                ),
                None => tracing::info!("Roll log cleared"),
            },
            Err(e) => tracing::warn!(error = %e, "Failed to read rolls"),
        },
        CacheUpdate::Encounter {
            session_id,
            encounter_id,
        } => match sessions.encounter(session_id, encounter_id).await {
            Ok(Some(encounter)) => tracing::info!(
                encounter_id = %encounter.id,
                name = %encounter.name,
                turn = encounter.turn,
                hidden = encounter.hidden,
                "Encounter updated"
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read encounter"),
        },
        CacheUpdate::Character {
            session_id,
            character_id,
        } => match sessions.character(session_id, character_id).await {
            Ok(character) => tracing::info!(
                character_id = %character.id,
                name = %character.name,
                "Character updated"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to read character"),
        },
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
