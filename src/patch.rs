use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::characters;
use crate::types::*;

// Field edits arrive from the control panel as dot-paths. The legal targets
// are a closed set: `character` is not patchable (character changes go
// through session::change_character so the color is recomputed with them)
// and `side` is positional, moved only by the side swap.

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("unknown patch path \"{0}\"")]
    UnknownPath(String),
    #[error("{target} expects {expected}")]
    TypeMismatch { target: String, expected: &'static str },
    #[error("{target}: {reason}")]
    InvalidValue { target: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Port,
    Tag,
    Sponsor,
    Handle,
    CountryCode,
    CharacterColor,
    Score,
}

impl PlayerField {
    const ALL: [PlayerField; 7] = [
        PlayerField::Port,
        PlayerField::Tag,
        PlayerField::Sponsor,
        PlayerField::Handle,
        PlayerField::CountryCode,
        PlayerField::CharacterColor,
        PlayerField::Score,
    ];

    fn wire_name(self) -> &'static str {
        match self {
            PlayerField::Port => "port",
            PlayerField::Tag => "tag",
            PlayerField::Sponsor => "sponsor",
            PlayerField::Handle => "handle",
            PlayerField::CountryCode => "countryCode",
            PlayerField::CharacterColor => "characterColor",
            PlayerField::Score => "score",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.wire_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Tournament,
    Round,
    BestOf,
    GameNumber,
    Stage,
    Notes,
}

impl MetaField {
    const ALL: [MetaField; 6] = [
        MetaField::Tournament,
        MetaField::Round,
        MetaField::BestOf,
        MetaField::GameNumber,
        MetaField::Stage,
        MetaField::Notes,
    ];

    fn wire_name(self) -> &'static str {
        match self {
            MetaField::Tournament => "tournament",
            MetaField::Round => "round",
            MetaField::BestOf => "bestOf",
            MetaField::GameNumber => "gameNumber",
            MetaField::Stage => "stage",
            MetaField::Notes => "notes",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.wire_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    Player(PlayerKey, PlayerField),
    Meta(MetaField),
}

impl PatchTarget {
    pub fn parse(path: &str) -> Result<Self, PatchError> {
        let unknown = || PatchError::UnknownPath(path.to_string());
        let (head, leaf) = path.split_once('.').ok_or_else(unknown)?;
        match head {
            "p1" => PlayerField::from_wire(leaf).map(|field| PatchTarget::Player(PlayerKey::P1, field)),
            "p2" => PlayerField::from_wire(leaf).map(|field| PatchTarget::Player(PlayerKey::P2, field)),
            "meta" => MetaField::from_wire(leaf).map(PatchTarget::Meta),
            _ => None,
        }
        .ok_or_else(unknown)
    }
}

impl fmt::Display for PatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchTarget::Player(key, field) => write!(f, "{}.{}", key.as_str(), field.wire_name()),
            PatchTarget::Meta(field) => write!(f, "meta.{}", field.wire_name()),
        }
    }
}

// Produces a new configuration with exactly one field changed. Only the
// record holding the leaf is copied; sibling records keep their Arcs. The
// input is never mutated, also not on error.
pub fn apply_patch(
    state: &OverlayState,
    target: PatchTarget,
    value: &Value,
) -> Result<OverlayState, PatchError> {
    let mut next = state.clone();
    match target {
        PatchTarget::Player(key, field) => {
            apply_player_field(Arc::make_mut(next.player_mut(key)), target, field, value)?;
        }
        PatchTarget::Meta(field) => {
            apply_meta_field(Arc::make_mut(&mut next.meta), target, field, value)?;
        }
    }
    Ok(next)
}

fn apply_player_field(
    player: &mut PlayerState,
    target: PatchTarget,
    field: PlayerField,
    value: &Value,
) -> Result<(), PatchError> {
    match field {
        PlayerField::Port => {
            player.port = match opt_u64(target, value, "a port number")? {
                Some(n) if (MIN_PORT as u64..=MAX_PORT as u64).contains(&n) => Some(n as u8),
                Some(n) => {
                    return Err(PatchError::InvalidValue {
                        target: target.to_string(),
                        reason: format!("port {n} outside {MIN_PORT}-{MAX_PORT}"),
                    })
                }
                None => None,
            };
        }
        PlayerField::Tag => player.tag = required_string(target, value)?,
        PlayerField::Sponsor => player.sponsor = opt_string(target, value)?,
        PlayerField::Handle => player.handle = opt_string(target, value)?,
        PlayerField::CountryCode => player.country_code = opt_string(target, value)?,
        PlayerField::CharacterColor => {
            let color = required_string(target, value)?;
            let Some(character) = player.character.as_deref() else {
                return Err(PatchError::InvalidValue {
                    target: target.to_string(),
                    reason: "no character selected".to_string(),
                });
            };
            if !characters::is_legal_color(character, &color) {
                return Err(PatchError::InvalidValue {
                    target: target.to_string(),
                    reason: format!("\"{color}\" is not a {character} color"),
                });
            }
            player.character_color = color;
        }
        PlayerField::Score => {
            let score = required_u64(target, value, "a non-negative number")?;
            player.score = u32::try_from(score).map_err(|_| PatchError::InvalidValue {
                target: target.to_string(),
                reason: format!("score {score} out of range"),
            })?;
        }
    }
    Ok(())
}

fn apply_meta_field(
    meta: &mut MatchMeta,
    target: PatchTarget,
    field: MetaField,
    value: &Value,
) -> Result<(), PatchError> {
    match field {
        MetaField::Tournament => meta.tournament = opt_string(target, value)?,
        MetaField::Round => meta.round = required_string(target, value)?,
        MetaField::BestOf => {
            let n = required_u64(target, value, "a number")?;
            meta.best_of = u8::try_from(n)
                .ok()
                .filter(|best_of| BEST_OF_CHOICES.contains(best_of))
                .ok_or_else(|| PatchError::InvalidValue {
                    target: target.to_string(),
                    reason: format!("bestOf must be 3 or 5, got {n}"),
                })?;
        }
        MetaField::GameNumber => {
            meta.game_number = match opt_u64(target, value, "a game number")? {
                Some(0) => {
                    return Err(PatchError::InvalidValue {
                        target: target.to_string(),
                        reason: "gameNumber must be at least 1".to_string(),
                    })
                }
                Some(n) => Some(u32::try_from(n).map_err(|_| PatchError::InvalidValue {
                    target: target.to_string(),
                    reason: format!("gameNumber {n} out of range"),
                })?),
                None => None,
            };
        }
        MetaField::Stage => meta.stage = opt_string(target, value)?,
        MetaField::Notes => meta.notes = opt_string(target, value)?,
    }
    Ok(())
}

fn required_string(target: PatchTarget, value: &Value) -> Result<String, PatchError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| PatchError::TypeMismatch {
            target: target.to_string(),
            expected: "a string",
        })
}

fn opt_string(target: PatchTarget, value: &Value) -> Result<Option<String>, PatchError> {
    if value.is_null() {
        return Ok(None);
    }
    required_string(target, value).map(Some)
}

fn required_u64(target: PatchTarget, value: &Value, expected: &'static str) -> Result<u64, PatchError> {
    value.as_u64().ok_or_else(|| PatchError::TypeMismatch {
        target: target.to_string(),
        expected,
    })
}

fn opt_u64(target: PatchTarget, value: &Value, expected: &'static str) -> Result<Option<u64>, PatchError> {
    if value.is_null() {
        return Ok(None);
    }
    required_u64(target, value, expected).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_test_state() -> OverlayState {
        let mut state = OverlayState::bootstrap();
        state.commentators = Arc::new(vec![CommentaryState {
            name: "Scar".to_string(),
            handle: Some("@scar".to_string()),
            active: Some(true),
        }]);
        state
    }

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(
            PatchTarget::parse("p1.tag").unwrap(),
            PatchTarget::Player(PlayerKey::P1, PlayerField::Tag)
        );
        assert_eq!(
            PatchTarget::parse("p2.characterColor").unwrap(),
            PatchTarget::Player(PlayerKey::P2, PlayerField::CharacterColor)
        );
        assert_eq!(
            PatchTarget::parse("meta.bestOf").unwrap(),
            PatchTarget::Meta(MetaField::BestOf)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_paths() {
        for path in ["p1.character", "p1.side", "meta", "p3.tag", "commentators.0.name", ""] {
            let err = PatchTarget::parse(path).unwrap_err();
            assert!(matches!(err, PatchError::UnknownPath(_)), "{path} parsed");
        }
    }

    #[test]
    fn test_patch_changes_only_target_record() {
        let state = make_test_state();
        let target = PatchTarget::parse("meta.round").unwrap();

        let next = apply_patch(&state, target, &json!("GF")).unwrap();

        assert_eq!(next.meta.round, "GF");
        assert_eq!(next.meta.best_of, state.meta.best_of);
        assert_eq!(next.meta.tournament, state.meta.tournament);
        assert!(Arc::ptr_eq(&next.p1, &state.p1));
        assert!(Arc::ptr_eq(&next.p2, &state.p2));
        assert!(Arc::ptr_eq(&next.commentators, &state.commentators));
    }

    #[test]
    fn test_patch_does_not_mutate_input() {
        let state = make_test_state();
        let before = state.clone();
        let target = PatchTarget::parse("p1.score").unwrap();

        let next = apply_patch(&state, target, &json!(2)).unwrap();

        assert_eq!(state, before);
        assert_eq!(next.p1.score, 2);
        assert_eq!(state.p1.score, 0);
        assert!(Arc::ptr_eq(&next.p2, &state.p2));
        assert!(Arc::ptr_eq(&next.meta, &state.meta));
    }

    #[test]
    fn test_best_of_patch() {
        let mut state = make_test_state();
        Arc::make_mut(&mut state.meta).best_of = 3;
        let target = PatchTarget::parse("meta.bestOf").unwrap();

        let next = apply_patch(&state, target, &json!(5)).unwrap();
        assert_eq!(next.meta.best_of, 5);
        assert_eq!(next.meta.round, state.meta.round);
        assert!(Arc::ptr_eq(&next.p1, &state.p1));
        assert!(Arc::ptr_eq(&next.p2, &state.p2));

        let err = apply_patch(&state, target, &json!(4)).unwrap_err();
        assert!(matches!(err, PatchError::InvalidValue { .. }));
        let err = apply_patch(&state, target, &json!("5")).unwrap_err();
        assert!(matches!(err, PatchError::TypeMismatch { .. }));
    }

    #[test]
    fn test_score_rejects_wrong_types() {
        let state = make_test_state();
        let before = state.clone();
        let target = PatchTarget::parse("p1.score").unwrap();

        assert!(matches!(
            apply_patch(&state, target, &json!(-1)).unwrap_err(),
            PatchError::TypeMismatch { .. }
        ));
        assert!(matches!(
            apply_patch(&state, target, &json!("3")).unwrap_err(),
            PatchError::TypeMismatch { .. }
        ));
        // a rejected patch leaves the input alone
        assert_eq!(state, before);
    }

    #[test]
    fn test_port_range() {
        let state = make_test_state();
        let target = PatchTarget::parse("p2.port").unwrap();

        let next = apply_patch(&state, target, &json!(3)).unwrap();
        assert_eq!(next.p2.port, Some(3));

        let cleared = apply_patch(&state, target, &Value::Null).unwrap();
        assert_eq!(cleared.p2.port, None);

        for bad in [json!(0), json!(5)] {
            assert!(matches!(
                apply_patch(&state, target, &bad).unwrap_err(),
                PatchError::InvalidValue { .. }
            ));
        }
    }

    #[test]
    fn test_game_number_positive() {
        let state = make_test_state();
        let target = PatchTarget::parse("meta.gameNumber").unwrap();

        let next = apply_patch(&state, target, &json!(2)).unwrap();
        assert_eq!(next.meta.game_number, Some(2));

        let cleared = apply_patch(&state, target, &Value::Null).unwrap();
        assert_eq!(cleared.meta.game_number, None);

        assert!(matches!(
            apply_patch(&state, target, &json!(0)).unwrap_err(),
            PatchError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_color_patch_checks_catalog() {
        let state = make_test_state();
        let target = PatchTarget::parse("p1.characterColor").unwrap();

        // p1 is Falco; Green is listed, Purple is not.
        let next = apply_patch(&state, target, &json!("Green")).unwrap();
        assert_eq!(next.p1.character_color, "Green");

        assert!(matches!(
            apply_patch(&state, target, &json!("Purple")).unwrap_err(),
            PatchError::InvalidValue { .. }
        ));

        let mut unset = make_test_state();
        let p1 = Arc::make_mut(&mut unset.p1);
        p1.character = None;
        p1.character_color = String::new();
        assert!(matches!(
            apply_patch(&unset, target, &json!("Default")).unwrap_err(),
            PatchError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_optional_text_clears_with_null() {
        let state = make_test_state();

        let sponsor = PatchTarget::parse("p1.sponsor").unwrap();
        let set = apply_patch(&state, sponsor, &json!("C9")).unwrap();
        assert_eq!(set.p1.sponsor.as_deref(), Some("C9"));
        let cleared = apply_patch(&set, sponsor, &Value::Null).unwrap();
        assert_eq!(cleared.p1.sponsor, None);

        // tag is required text; null is a type error, empty string is fine
        let tag = PatchTarget::parse("p1.tag").unwrap();
        assert!(matches!(
            apply_patch(&state, tag, &Value::Null).unwrap_err(),
            PatchError::TypeMismatch { .. }
        ));
        let blank = apply_patch(&state, tag, &json!("")).unwrap();
        assert_eq!(blank.p1.tag, "");
    }
}
