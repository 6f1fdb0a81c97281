use serde_json::Value;
use std::{mem, sync::Arc};
use thiserror::Error;
use tracing::warn;

use crate::characters;
use crate::patch::{apply_patch, PatchError, PatchTarget};
use crate::types::*;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no configuration loaded")]
    NotLoaded,
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("{0}")]
    Invalid(String),
}

// ── Edit session ───────────────────────────────────────────────────────

// Owns the one editable configuration per session plus the transient
// active-setup index. The index is view state and is never persisted.
// Mutations are produce-then-commit: callers run any fallible persistence
// between the two, so a failed save leaves the last known-good value.
#[derive(Default)]
pub struct EditSession {
    state: Option<AllSetupsState>,
    active: usize,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn install(&mut self, state: AllSetupsState) {
        self.state = Some(state);
    }

    pub fn state(&self) -> Option<&AllSetupsState> {
        self.state.as_ref()
    }

    pub fn active_setup(&self) -> usize {
        self.active
    }

    pub fn select(&mut self, requested: i64) -> usize {
        self.active = effective_index(requested);
        self.active
    }

    pub fn resolve_setup(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(index) => effective_index(index),
            None => self.active,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            loaded: self.loaded(),
            active_setup: self.active,
            state: self.state.clone(),
        }
    }

    pub fn patched(
        &self,
        setup: usize,
        target: PatchTarget,
        value: &Value,
    ) -> Result<AllSetupsState, SessionError> {
        let (all, record) = self.setup_at(setup)?;
        let next = apply_patch(record, target, value)?;
        Ok(with_setup(all, setup, next))
    }

    pub fn with_character(
        &self,
        setup: usize,
        player: PlayerKey,
        character: &str,
    ) -> Result<AllSetupsState, SessionError> {
        let (all, record) = self.setup_at(setup)?;
        let next = change_character(record, player, character);
        Ok(with_setup(all, setup, next))
    }

    pub fn swapped(&self, setup: usize) -> Result<AllSetupsState, SessionError> {
        let (all, record) = self.setup_at(setup)?;
        let next = swap_sides(record);
        Ok(with_setup(all, setup, next))
    }

    pub fn with_commentators(
        &self,
        setup: usize,
        commentators: Vec<CommentaryState>,
    ) -> Result<AllSetupsState, SessionError> {
        let (all, record) = self.setup_at(setup)?;
        let mut next = record.clone();
        next.commentators = Arc::new(commentators);
        Ok(with_setup(all, setup, next))
    }

    pub fn replaced(&self, candidate: AllSetupsState) -> Result<AllSetupsState, SessionError> {
        self.current()?;
        validate_state(&candidate).map_err(SessionError::Invalid)?;
        Ok(normalize_state(candidate))
    }

    pub fn commit(&mut self, next: AllSetupsState) {
        self.state = Some(next);
    }

    fn current(&self) -> Result<&AllSetupsState, SessionError> {
        self.state.as_ref().ok_or(SessionError::NotLoaded)
    }

    fn setup_at(&self, setup: usize) -> Result<(&AllSetupsState, &OverlayState), SessionError> {
        let all = self.current()?;
        let record = all
            .setups
            .get(setup)
            .ok_or_else(|| SessionError::Invalid(format!("setup index {setup} out of range")))?;
        Ok((all, record))
    }
}

pub fn effective_index(requested: i64) -> usize {
    if (0..SETUP_COUNT as i64).contains(&requested) {
        requested as usize
    } else {
        0
    }
}

fn with_setup(all: &AllSetupsState, index: usize, next: OverlayState) -> AllSetupsState {
    let mut setups = all.setups.clone();
    if let Some(slot) = setups.get_mut(index) {
        *slot = next;
    }
    AllSetupsState { setups }
}

// ── Character change ───────────────────────────────────────────────────

// Character and color move together in one new-value production; no state
// with a stale color is ever observable. Unknown names clear the selection
// rather than fail.
pub fn change_character(state: &OverlayState, player: PlayerKey, character: &str) -> OverlayState {
    let mut next = state.clone();
    let record = Arc::make_mut(next.player_mut(player));
    let trimmed = character.trim();
    if trimmed.is_empty() {
        record.character = None;
        record.character_color = String::new();
    } else if characters::is_known_character(trimmed) {
        record.character = Some(trimmed.to_string());
        record.character_color = characters::default_color_for(trimmed).to_string();
    } else {
        warn!("unknown character \"{trimmed}\", clearing selection");
        record.character = None;
        record.character_color = String::new();
    }
    next
}

// ── Side swap ──────────────────────────────────────────────────────────

// Full record exchange, then sides re-normalized: p1 renders left, p2
// right. Meta and commentators keep their Arcs.
pub fn swap_sides(state: &OverlayState) -> OverlayState {
    let mut next = state.clone();
    mem::swap(&mut next.p1, &mut next.p2);
    Arc::make_mut(&mut next.p1).side = Side::Left;
    Arc::make_mut(&mut next.p2).side = Side::Right;
    next
}

// ── Validation and repair ──────────────────────────────────────────────

pub fn validate_state(state: &AllSetupsState) -> Result<(), String> {
    if state.setups.len() != SETUP_COUNT {
        return Err(format!(
            "expected {SETUP_COUNT} setups, got {}",
            state.setups.len()
        ));
    }
    for (index, setup) in state.setups.iter().enumerate() {
        validate_setup(index, setup)?;
    }
    Ok(())
}

fn validate_setup(index: usize, setup: &OverlayState) -> Result<(), String> {
    for key in [PlayerKey::P1, PlayerKey::P2] {
        let player = setup.player(key);
        let label = key.as_str();
        if let Some(character) = setup_character(player) {
            if !characters::is_known_character(character) {
                return Err(format!(
                    "setup {index} {label}: unknown character \"{character}\""
                ));
            }
            if !characters::is_legal_color(character, &player.character_color) {
                return Err(format!(
                    "setup {index} {label}: \"{}\" is not a {character} color",
                    player.character_color
                ));
            }
        }
        if let Some(port) = player.port {
            if !(MIN_PORT..=MAX_PORT).contains(&port) {
                return Err(format!(
                    "setup {index} {label}: port {port} outside {MIN_PORT}-{MAX_PORT}"
                ));
            }
        }
    }
    if !BEST_OF_CHOICES.contains(&setup.meta.best_of) {
        return Err(format!(
            "setup {index}: bestOf must be 3 or 5, got {}",
            setup.meta.best_of
        ));
    }
    if setup.meta.game_number == Some(0) {
        return Err(format!("setup {index}: gameNumber must be at least 1"));
    }
    Ok(())
}

fn setup_character(player: &PlayerState) -> Option<&str> {
    player.character.as_deref().filter(|name| !name.is_empty())
}

// Repairs a state from outside the process so the in-memory invariants
// hold: exactly SETUP_COUNT setups, positional sides, catalog-backed
// characters and colors, bestOf in the legal set.
pub fn normalize_state(mut state: AllSetupsState) -> AllSetupsState {
    state.setups.truncate(SETUP_COUNT);
    while state.setups.len() < SETUP_COUNT {
        state.setups.push(OverlayState::bootstrap());
    }
    for setup in &mut state.setups {
        normalize_player(Arc::make_mut(&mut setup.p1), Side::Left);
        normalize_player(Arc::make_mut(&mut setup.p2), Side::Right);
        let meta = Arc::make_mut(&mut setup.meta);
        if !BEST_OF_CHOICES.contains(&meta.best_of) {
            meta.best_of = 3;
        }
        if meta.game_number == Some(0) {
            meta.game_number = None;
        }
    }
    state
}

fn normalize_player(player: &mut PlayerState, side: Side) {
    player.side = side;
    match player.character.as_deref() {
        None | Some("") => {
            player.character = None;
            player.character_color = String::new();
        }
        Some(character) if characters::is_known_character(character) => {
            if !characters::is_legal_color(character, &player.character_color) {
                player.character_color = characters::default_color_for(character).to_string();
            }
        }
        Some(unknown) => {
            warn!("dropping unknown character \"{unknown}\"");
            player.character = None;
            player.character_color = String::new();
        }
    }
    if let Some(port) = player.port {
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            player.port = None;
        }
    }
}
