use engine::{
    Facing, Mat4, RenderTarget, Scene, SceneId, SceneState, Tilemap, TilemapError, Vec2, Vec3,
    TILE_EMPTY,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub(crate) const LEVEL_A_JSON: &str = include_str!("../../assets/levels/level_a.json");
pub(crate) const LEVEL_B_JSON: &str = include_str!("../../assets/levels/level_b.json");

const TILE_GROUND: u16 = 1;
const TILE_PLATFORM: u16 = 2;

const GROUND_COLOR: [u8; 4] = [96, 72, 48, 255];
const PLATFORM_COLOR: [u8; 4] = [168, 128, 64, 255];
const PLAYER_COLOR: [u8; 4] = [232, 200, 48, 255];
const EYE_COLOR: [u8; 4] = [24, 24, 24, 255];

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("level json invalid at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level has no rows")]
    NoRows,
    #[error("row {row} is {actual} tiles wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        row: usize,
        column: usize,
        glyph: char,
    },
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
}

/// On-disk level layout. Rows are listed top to bottom.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelDef {
    origin: [f32; 2],
    rows: Vec<String>,
    player_spawn: [f32; 2],
    #[serde(default)]
    exit_x: Option<f32>,
    #[serde(default)]
    next_scene: Option<usize>,
}

fn parse_level_json(raw: &str) -> Result<LevelDef, LevelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        LevelError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

fn tile_for_glyph(glyph: char) -> Option<u16> {
    match glyph {
        '.' => Some(TILE_EMPTY),
        '#' => Some(TILE_GROUND),
        '=' => Some(TILE_PLATFORM),
        _ => None,
    }
}

fn build_tilemap(def: &LevelDef) -> Result<Tilemap, LevelError> {
    let expected = def.rows.first().ok_or(LevelError::NoRows)?.chars().count();
    let height = def.rows.len();
    let mut tiles = vec![TILE_EMPTY; expected * height];

    for (row, line) in def.rows.iter().enumerate() {
        let actual = line.chars().count();
        if actual != expected {
            return Err(LevelError::RaggedRow {
                row,
                expected,
                actual,
            });
        }
        // Tile rows count up from the bottom of the map.
        let y = height - 1 - row;
        for (column, glyph) in line.chars().enumerate() {
            let tile = tile_for_glyph(glyph).ok_or(LevelError::UnknownGlyph { row, column, glyph })?;
            tiles[y * expected + column] = tile;
        }
    }

    Ok(Tilemap::new(
        expected as u32,
        height as u32,
        Vec2::from(def.origin),
        tiles,
    )?)
}

fn tile_color(tile: u16) -> [u8; 4] {
    if tile == TILE_PLATFORM {
        PLATFORM_COLOR
    } else {
        GROUND_COLOR
    }
}

/// A playable level: static tile geometry, a spawn point and an optional exit.
pub(crate) struct LevelScene {
    name: &'static str,
    map: Tilemap,
    spawn: Vec2,
    exit: Option<(f32, SceneId)>,
}

impl LevelScene {
    pub(crate) fn from_json(name: &'static str, raw: &str) -> Result<Self, LevelError> {
        let def = parse_level_json(raw)?;
        let map = build_tilemap(&def)?;
        let exit = def.exit_x.zip(def.next_scene.map(SceneId));
        Ok(Self {
            name,
            map,
            spawn: Vec2::from(def.player_spawn),
            exit,
        })
    }
}

impl Scene for LevelScene {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialise(&mut self, state: &mut SceneState) {
        state.map = self.map.clone();
        state.player.respawn(self.spawn);
        state.next_scene = None;
        info!(
            level = self.name,
            width = state.map.width(),
            height = state.map.height(),
            spawn_x = self.spawn.x,
            spawn_y = self.spawn.y,
            "level_started"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, state: &mut SceneState) {
        state.player.step(fixed_dt_seconds, &state.map);

        if let Some((exit_x, next_scene)) = self.exit {
            if state.next_scene.is_none() && state.player.position().x > exit_x {
                debug!(level = self.name, next = next_scene.0, "level_exit_reached");
                state.next_scene = Some(next_scene);
            }
        }
    }

    fn render(&self, state: &SceneState, target: &mut dyn RenderTarget) {
        for (x, y, tile) in state.map.solid_tiles() {
            if let Some(center) = state.map.tile_center_world(x, y) {
                target.draw_quad(Mat4::from_translation(center.extend(0.0)), tile_color(tile));
            }
        }

        let player = &state.player;
        let size = player.half_extents() * 2.0;
        target.draw_quad(
            Mat4::from_translation(player.position().extend(0.0))
                * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0)),
            PLAYER_COLOR,
        );
        let eye = player.position()
            + Vec2::new(
                player.half_extents().x * 0.5 * facing_sign(player.facing()),
                player.half_extents().y * 0.4,
            );
        target.draw_quad(
            Mat4::from_translation(eye.extend(0.0)) * Mat4::from_scale(Vec3::new(0.12, 0.12, 1.0)),
            EYE_COLOR,
        );
    }
}

fn facing_sign(facing: Facing) -> f32 {
    match facing {
        Facing::Left => -1.0,
        Facing::Right => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use engine::{FallThroughRule, SceneMachine};

    use super::*;

    #[derive(Default)]
    struct CountingTarget {
        view_set: bool,
        quads: Vec<[u8; 4]>,
    }

    impl RenderTarget for CountingTarget {
        fn set_view_projection(&mut self, _view: Mat4, _projection: Mat4) {
            self.view_set = true;
        }

        fn draw_quad(&mut self, _model: Mat4, color: [u8; 4]) {
            self.quads.push(color);
        }
    }

    fn level_a() -> LevelScene {
        LevelScene::from_json("LevelA", LEVEL_A_JSON).expect("level a")
    }

    fn initialised(scene: &mut LevelScene) -> SceneState {
        let mut state = SceneState::default();
        scene.initialise(&mut state);
        state
    }

    #[test]
    fn embedded_levels_parse() {
        let a = level_a();
        assert_eq!((a.map.width(), a.map.height()), (24, 8));
        assert_eq!(a.exit, Some((22.5, SceneId(1))));

        let b = LevelScene::from_json("LevelB", LEVEL_B_JSON).expect("level b");
        assert_eq!((b.map.width(), b.map.height()), (20, 6));
        assert_eq!(b.exit, Some((17.5, SceneId(0))));
    }

    #[test]
    fn top_row_of_text_is_the_highest_tile_row() {
        let raw = r###"{
            "origin": [0.0, 0.0],
            "rows": ["#..", "..="],
            "player_spawn": [1.0, 3.0]
        }"###;
        let scene = LevelScene::from_json("Tiny", raw).expect("level");

        assert_eq!(scene.map.tile_at(0, 1), Some(TILE_GROUND));
        assert_eq!(scene.map.tile_at(2, 0), Some(TILE_PLATFORM));
        assert_eq!(scene.map.tile_at(0, 0), Some(TILE_EMPTY));
        assert_eq!(scene.exit, None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let raw = r####"{
            "origin": [0.0, 0.0],
            "rows": ["###", "##"],
            "player_spawn": [1.0, 3.0]
        }"####;
        let error = LevelScene::from_json("Bad", raw).err().expect("error");
        assert!(matches!(
            error,
            LevelError::RaggedRow {
                row: 1,
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn unknown_glyph_is_rejected() {
        let raw = r###"{
            "origin": [0.0, 0.0],
            "rows": ["#?#"],
            "player_spawn": [1.0, 3.0]
        }"###;
        let error = LevelScene::from_json("Bad", raw).err().expect("error");
        assert!(matches!(
            error,
            LevelError::UnknownGlyph {
                row: 0,
                column: 1,
                glyph: '?'
            }
        ));
    }

    #[test]
    fn empty_rows_are_rejected() {
        let raw = r###"{ "origin": [0.0, 0.0], "rows": [], "player_spawn": [0.0, 0.0] }"###;
        let error = LevelScene::from_json("Bad", raw).err().expect("error");
        assert!(matches!(error, LevelError::NoRows));
    }

    #[test]
    fn parse_error_reports_field_path() {
        let raw = r###"{ "origin": [0.0, 0.0], "rows": ["#"], "player_spawn": [0.0, "up"] }"###;
        let error = LevelScene::from_json("Bad", raw).err().expect("error");
        match error {
            LevelError::Parse { path, .. } => assert_eq!(path, "player_spawn[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn initialise_respawns_player_and_clears_request() {
        let mut scene = level_a();
        let mut state = initialised(&mut scene);
        state.player.teleport(Vec2::new(20.0, -2.0));
        state.next_scene = Some(SceneId(1));

        scene.initialise(&mut state);

        assert_eq!(state.player.position(), Vec2::new(3.0, -5.0));
        assert_eq!(state.next_scene, None);
        assert_eq!(state.map, scene.map);
    }

    #[test]
    fn player_settles_on_ground() {
        let mut scene = level_a();
        let mut state = initialised(&mut scene);

        for _ in 0..120 {
            scene.update(1.0 / 60.0, &mut state);
        }

        assert!(state.player.collided_bottom());
        assert!((state.player.position().y - (-5.5)).abs() < 1e-3);
    }

    #[test]
    fn crossing_exit_requests_next_scene() {
        let mut scene = level_a();
        let mut state = initialised(&mut scene);
        state.player.teleport(Vec2::new(22.4, -5.5));
        scene.update(1.0 / 60.0, &mut state);
        assert_eq!(state.next_scene, None);

        state.player.teleport(Vec2::new(22.6, -5.5));
        scene.update(1.0 / 60.0, &mut state);
        assert_eq!(state.next_scene, Some(SceneId(1)));
    }

    #[test]
    fn falling_through_the_gap_triggers_fall_through() {
        let scenes: Vec<Box<dyn Scene>> = vec![
            Box::new(level_a()),
            Box::new(LevelScene::from_json("LevelB", LEVEL_B_JSON).expect("level b")),
        ];
        let mut machine = SceneMachine::new(
            scenes,
            Some(FallThroughRule {
                from: SceneId(0),
                to: SceneId(1),
                below_y: -10.0,
            }),
        )
        .expect("machine");
        machine
            .active_state_mut()
            .player
            .teleport(Vec2::new(15.0, -5.5));

        let mut pending = None;
        for _ in 0..240 {
            machine.update_active(1.0 / 60.0);
            pending = machine.pending_transition();
            if pending.is_some() {
                break;
            }
        }

        assert_eq!(pending, Some(SceneId(1)));
        assert!(machine.active_state().player.position().y < -10.0);
    }

    #[test]
    fn render_draws_every_solid_tile_and_the_player() {
        let mut scene = level_a();
        let state = initialised(&mut scene);
        let mut target = CountingTarget::default();

        scene.render(&state, &mut target);

        let solid = state.map.solid_tiles().count();
        assert_eq!(target.quads.len(), solid + 2);
        assert!(!target.view_set);
        assert_eq!(target.quads[solid], PLAYER_COLOR);
        assert!(target.quads.contains(&PLATFORM_COLOR));
    }
}
