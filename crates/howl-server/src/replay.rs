use serde::Serialize;

use howl_core::log::LogEntry;
use howl_core::time::timestamp_now;
use howl_game::Game;

/// One replay event. The payload is opaque JSON: the engine records and
/// exports it but never interprets it.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayEvent {
    pub seq: u64,
    pub timestamp: String,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Append-only per-room event recorder for offline playback.
#[derive(Debug, Default)]
pub struct ReplayRecorder {
    events: Vec<ReplayEvent>,
    started: Option<String>,
    log_cursor: usize,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            started: Some(timestamp_now()),
            log_cursor: 0,
        }
    }

    pub fn add(&mut self, kind: &str, payload: serde_json::Value) {
        self.events.push(ReplayEvent {
            seq: self.events.len() as u64,
            timestamp: timestamp_now(),
            kind: kind.to_string(),
            payload,
        });
    }

    /// Mirror freshly appended game-log entries into the replay stream.
    pub fn sync_from_log(&mut self, log: &[LogEntry]) {
        while self.log_cursor < log.len() {
            let entry = &log[self.log_cursor];
            self.log_cursor += 1;
            match serde_json::to_value(entry) {
                Ok(value) => self.add("log", value),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize log entry for replay"),
            }
        }
    }

    /// Export the full ordered event stream. Roles are included: a replay is
    /// a post-game artifact.
    pub fn export(&self, game: &Game) -> serde_json::Value {
        let players: Vec<serde_json::Value> = game
            .players
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id.to_string(),
                    "name": p.display_name,
                    "role": p.role,
                    "position": p.position,
                    "alive": p.alive,
                })
            })
            .collect();
        serde_json::json!({
            "room_id": game.room_id.to_string(),
            "room_name": game.room_name,
            "started": self.started,
            "exported": timestamp_now(),
            "winner": game.winner,
            "players": players,
            "events": self.events,
        })
    }
}
