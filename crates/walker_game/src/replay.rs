//! Scripted key input for deterministic loop tests.
//!
//! ```json
//! { "frames": [ { "held": ["ArrowRight"], "repeat": 10 }, { "held": [] } ] }
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use walker_core::input::{InputState, Key};

#[derive(Debug, Deserialize, Clone)]
pub struct KeyReplay {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Key names as the platform reports them (`"ArrowLeft"`, ...).
    #[serde(default)]
    pub held: Vec<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl KeyReplay {
    /// One held-key set per tick.
    pub fn expanded_inputs(&self) -> Vec<Vec<Key>> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let keys: Vec<Key> = frame
                .held
                .iter()
                .filter_map(|name| Key::from_name(name))
                .collect();
            for _ in 0..frame.repeat.max(1) {
                out.push(keys.clone());
            }
        }
        out
    }
}

/// Make `input` hold exactly `keys`, through the same key events the app
/// delivers.
pub fn apply_held(input: &mut InputState, keys: &[Key]) {
    for key in Key::ARROWS {
        if keys.contains(&key) {
            input.key_down(key);
        } else {
            input.key_up(key);
        }
    }
}

pub fn parse_replay(raw: &str) -> Result<KeyReplay, String> {
    let replay: KeyReplay =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse replay JSON: {e}"))?;
    validate_replay(&replay)?;
    Ok(replay)
}

pub fn load_replay_from_path(path: &Path) -> Result<KeyReplay, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_replay(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

fn validate_replay(replay: &KeyReplay) -> Result<(), String> {
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for frame in &replay.frames {
        if let Some(name) = frame.held.iter().find(|n| Key::from_name(n).is_none()) {
            return Err(format!("Replay validation failed: unknown key '{name}'"));
        }
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, ActorConfig, Facing};
    use crate::game_loop::Game;
    use crate::test_support::{hero_manifest, ManualScheduler, RecordingSurface, ScriptedLoader};
    use std::time::{SystemTime, UNIX_EPOCH};
    use walker_core::config::GameConfig;

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "walker_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    const WALK_SQUARE: &str = r#"{
      "frames": [
        { "held": ["ArrowRight"], "repeat": 10 },
        { "held": ["ArrowDown"], "repeat": 5 },
        { "held": ["ArrowLeft", "ArrowUp"], "repeat": 3 },
        { "held": [] }
      ]
    }"#;

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(&path, WALK_SQUARE).expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 19);
        assert_eq!(expanded[0], vec![Key::Right]);
        assert_eq!(expanded[15], vec![Key::Left, Key::Up]);
        assert!(expanded[18].is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_key_and_empty_replay_are_rejected() {
        let err = parse_replay(r#"{ "frames": [ { "held": ["Space"] } ] }"#)
            .expect_err("unknown key");
        assert!(err.contains("Space"));
        assert!(parse_replay(r#"{ "frames": [] }"#).is_err());
    }

    #[test]
    fn replay_run_is_deterministic() {
        let replay = parse_replay(WALK_SQUARE).expect("replay should parse");
        let inputs = replay.expanded_inputs();

        let run = || {
            let mut actor = Actor::new(ActorConfig::default());
            let mut input = InputState::new();
            for keys in &inputs {
                apply_held(&mut input, keys);
                actor.advance(&input);
                actor.tick_animation(Some(&[(); 4][..]));
                input.end_frame();
            }
            actor
        };
        let (a, b) = (run(), run());

        assert_eq!((a.x, a.y), (b.x, b.y));
        assert_eq!(a.facing, b.facing);
        assert_eq!(a.animation, b.animation);
    }

    #[test]
    fn replay_through_game_loop_reaches_expected_state() {
        let replay = parse_replay(WALK_SQUARE).expect("replay should parse");
        let mut game = Game::new(&GameConfig::default(), ManualScheduler::default());
        pollster::block_on(game.init(&hero_manifest(), &ScriptedLoader::new())).expect("init");
        game.start();

        let mut surface = RecordingSurface::default();
        for keys in replay.expanded_inputs() {
            apply_held(game.input_mut(), &keys);
            let handle = game.pending_tick().expect("pending tick");
            assert!(game.on_tick(handle, &mut surface));
        }

        // Right 10, down 5, then up-left 3 diagonally.
        let actor = game.actor();
        assert_eq!((actor.x, actor.y), (167.0, 98.0));
        assert_eq!(actor.facing, Facing::Up);
        assert!(!actor.is_moving);
        assert_eq!(actor.clip_key(), "idle_up");
        assert_eq!(game.tick_count(), 19);
        assert_eq!(surface.clears(), 19);
    }
}
