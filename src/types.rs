use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::session::EditSession;
use crate::store::StateStore;

// ── Constants ──────────────────────────────────────────────────────────

pub const SETUP_COUNT: usize = 4;
pub const MIN_PORT: u8 = 1;
pub const MAX_PORT: u8 = 4;
pub const BEST_OF_CHOICES: &[u8] = &[3, 5];
pub const ROUND_CODES: &[&str] = &["R1", "R2", "R3", "QF", "SF", "WF", "LF", "GF"];
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:17890";

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedSession = Arc<Mutex<EditSession>>;

// ── Overlay types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKey {
    P1,
    P2,
}

impl PlayerKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerKey::P1 => "p1",
            PlayerKey::P2 => "p2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub side: Side,
    pub port: Option<u8>,
    pub tag: String,
    pub sponsor: Option<String>,
    pub handle: Option<String>,
    pub character: Option<String>,
    pub character_color: String,
    pub score: u32,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryState {
    pub name: String,
    pub handle: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMeta {
    pub tournament: Option<String>,
    pub round: String,
    pub best_of: u8,
    pub game_number: Option<u32>,
    pub stage: Option<String>,
    pub notes: Option<String>,
}

// Records are Arc-shared: an edit clones only the record it touches, so
// untouched records stay pointer-equal across successive states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub p1: Arc<PlayerState>,
    pub p2: Arc<PlayerState>,
    pub meta: Arc<MatchMeta>,
    pub commentators: Arc<Vec<CommentaryState>>,
}

impl OverlayState {
    pub fn player(&self, key: PlayerKey) -> &Arc<PlayerState> {
        match key {
            PlayerKey::P1 => &self.p1,
            PlayerKey::P2 => &self.p2,
        }
    }

    pub fn player_mut(&mut self, key: PlayerKey) -> &mut Arc<PlayerState> {
        match key {
            PlayerKey::P1 => &mut self.p1,
            PlayerKey::P2 => &mut self.p2,
        }
    }

    pub fn bootstrap() -> Self {
        OverlayState {
            p1: Arc::new(PlayerState {
                side: Side::Left,
                port: Some(1),
                tag: "Player 1".to_string(),
                sponsor: None,
                handle: None,
                character: Some("Falco".to_string()),
                character_color: "Blue".to_string(),
                score: 0,
                country_code: None,
            }),
            p2: Arc::new(PlayerState {
                side: Side::Right,
                port: Some(2),
                tag: "Player 2".to_string(),
                sponsor: None,
                handle: None,
                character: Some("Marth".to_string()),
                character_color: "Red".to_string(),
                score: 0,
                country_code: None,
            }),
            meta: Arc::new(MatchMeta {
                tournament: Some("Melee Local".to_string()),
                round: "WF".to_string(),
                best_of: 5,
                game_number: Some(1),
                stage: None,
                notes: None,
            }),
            commentators: Arc::new(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllSetupsState {
    pub setups: Vec<OverlayState>,
}

impl AllSetupsState {
    pub fn bootstrap() -> Self {
        AllSetupsState {
            setups: (0..SETUP_COUNT).map(|_| OverlayState::bootstrap()).collect(),
        }
    }
}

// ── Server state ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct OverlayServerState {
    pub session: SharedSession,
    pub store: Arc<StateStore>,
}

// ── Control panel payloads ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub loaded: bool,
    pub active_setup: usize,
    pub state: Option<AllSetupsState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterInfo {
    pub name: &'static str,
    pub colors: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    pub characters: Vec<CharacterInfo>,
    pub round_codes: &'static [&'static str],
    pub best_of_choices: &'static [u8],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectPayload {
    pub index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchPayload {
    pub setup: Option<i64>,
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterPayload {
    pub setup: Option<i64>,
    pub player: PlayerKey,
    pub character: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentatorsPayload {
    pub setup: Option<i64>,
    pub commentators: Vec<CommentaryState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapPayload {
    pub setup: Option<i64>,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub overlay_dir: String,
    pub state_path: String,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            overlay_dir: "overlay".to_string(),
            state_path: "overlay/state.json".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}
