/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (every `*.txt` file, sorted by file name)
///   2. Built-in embedded levels
///
/// ## File format:
///   One grid row per line, all rows the same length. Trailing `\r`
///   and trailing blank lines are ignored. The level name is the file stem.
///
/// ## Tile legend:
///   '.' = Empty                  '1' = Player start (exactly one)
///   'X' = Exit (exactly one)     '#' = Block, impassable (BlockA0..6)
///   '~' = Block, platform        ':' = Block, passable (BlockB0..1)
///   '-' = Platform strip         'L' = Ladder
///   'G' = Gem                    'P' = Power-up gem
///   'A'..'D' = Enemy             'M' = Movable platform
///   'W' = Wall-jump tile         'F' = Floor prop    'f' = Crate prop

use std::path::{Path, PathBuf};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ActorConfig;
use crate::domain::actor::{Enemy, EnemyKind, Gem, MovableTile, WallTile};
use crate::domain::map::TileCollisionMap;
use crate::domain::tile::{cell_bounds, Tile, TileCollision};
use crate::sim::assets::{AssetHandle, NameRegistry, ResourceProvider};
use crate::sim::props::PropKind;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("there is no level {index}")]
    NoSuchLevel { index: usize },
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },
    #[error("unsupported tile type character '{ch}' at position {x}, {y}")]
    UnknownTile { ch: char, x: usize, y: usize },
    #[error("level has no starting point")]
    MissingStart,
    #[error("a level may only have one starting point (second at {x}, {y})")]
    DuplicateStart { x: usize, y: usize },
    #[error("level has no exit")]
    MissingExit,
    #[error("a level may only have one exit (second at {x}, {y})")]
    DuplicateExit { x: usize, y: usize },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Level source as text rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelDef {
    pub fn from_source(name: impl Into<String>, source: &str) -> Self {
        let mut rows: Vec<String> = source
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        while rows.last().is_some_and(|r| r.trim().is_empty()) {
            rows.pop();
        }
        LevelDef { name: name.into(), rows }
    }

    /// Grid text, one row per line.
    pub fn to_source(&self) -> String {
        let mut out = self.rows.join("\n");
        out.push('\n');
        out
    }

    /// Full parse against throwaway assets, for up-front validation.
    pub fn validate(&self) -> Result<(), LevelError> {
        LevelLoader::new(0, ActorConfig::default())
            .load(self, &mut NameRegistry::new())
            .map(|_| ())
    }
}

/// A parsed level: the static grid plus every spawn.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub map: TileCollisionMap,
    /// Bottom-center of the start cell.
    pub start: Vec2,
    /// Center of the exit cell.
    pub exit: Vec2,
    pub gems: Vec<Gem>,
    pub enemies: Vec<Enemy>,
    pub movable_tiles: Vec<MovableTile>,
    pub wall_tiles: Vec<WallTile>,
    pub props: Vec<(PropKind, Vec2)>,
}

/// Turns `LevelDef`s into `Level`s. Owns the generator that picks block
/// variants, so the same seed always yields the same visuals.
pub struct LevelLoader {
    rng: StdRng,
    actors: ActorConfig,
}

impl LevelLoader {
    pub fn new(seed: u64, actors: ActorConfig) -> Self {
        LevelLoader { rng: StdRng::seed_from_u64(seed), actors }
    }

    pub fn load(&mut self, def: &LevelDef, assets: &mut dyn ResourceProvider) -> Result<Level, LevelError> {
        let width = check_grid(&def.rows)?;
        let height = def.rows.len();

        let mut cells = Vec::with_capacity(width * height);
        let mut start: Option<Vec2> = None;
        let mut exit: Option<Vec2> = None;
        let mut level = Level {
            name: def.name.clone(),
            map: TileCollisionMap::new(0, 0, Vec::new()),
            start: Vec2::ZERO,
            exit: Vec2::ZERO,
            gems: Vec::new(),
            enemies: Vec::new(),
            movable_tiles: Vec::new(),
            wall_tiles: Vec::new(),
            props: Vec::new(),
        };

        for (y, row) in def.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = cell_bounds(x as i32, y as i32);
                let center = cell.center();
                let foot = cell.bottom_center();

                let tile = match ch {
                    '.' => Tile::open(),
                    'X' => {
                        if exit.is_some() {
                            return Err(LevelError::DuplicateExit { x, y });
                        }
                        exit = Some(center);
                        Tile::new(TileCollision::Passable, visual(assets, "Tiles/Exit"))
                    }
                    '1' => {
                        if start.is_some() {
                            return Err(LevelError::DuplicateStart { x, y });
                        }
                        start = Some(foot);
                        Tile::open()
                    }
                    'G' | 'P' => {
                        let power_up = ch == 'P';
                        let points = if power_up { self.actors.power_up_points } else { self.actors.gem_points };
                        level.gems.push(Gem::new(center, points, power_up));
                        Tile::open()
                    }
                    '-' => Tile::new(TileCollision::Platform, visual(assets, "Tiles/Platform")),
                    '~' => self.variety(assets, "BlockB", 2, TileCollision::Platform),
                    ':' => self.variety(assets, "BlockB", 2, TileCollision::Passable),
                    '#' => self.variety(assets, "BlockA", 7, TileCollision::Impassable),
                    'L' => Tile::new(TileCollision::Ladder, visual(assets, "Tiles/BlockB1")),
                    'A'..='D' => {
                        if let Some(kind) = EnemyKind::from_char(ch) {
                            level.enemies.push(Enemy::new(kind, foot));
                        }
                        Tile::open()
                    }
                    'M' => {
                        level.movable_tiles.push(MovableTile::new(center, self.actors.movable_speed));
                        Tile::open()
                    }
                    'W' => {
                        level.wall_tiles.push(WallTile::new(center));
                        Tile::new(TileCollision::Impassable, None)
                    }
                    'F' => {
                        level.props.push((PropKind::Floor, center));
                        Tile::new(TileCollision::Impassable, None)
                    }
                    'f' => {
                        level.props.push((PropKind::Crate, center));
                        Tile::open()
                    }
                    _ => return Err(LevelError::UnknownTile { ch, x, y }),
                };
                cells.push(tile);
            }
        }

        level.start = start.ok_or(LevelError::MissingStart)?;
        level.exit = exit.ok_or(LevelError::MissingExit)?;
        level.map = TileCollisionMap::new(width, height, cells);

        info!(
            name = %level.name, width, height,
            gems = level.gems.len(), enemies = level.enemies.len(),
            "level loaded"
        );
        Ok(level)
    }

    /// One of `count` look-alike tiles, chosen at random.
    fn variety(
        &mut self,
        assets: &mut dyn ResourceProvider,
        base: &str,
        count: u32,
        collision: TileCollision,
    ) -> Tile {
        let index = self.rng.gen_range(0..count);
        Tile::new(collision, visual(assets, &format!("Tiles/{base}{index}")))
    }
}

fn visual(assets: &mut dyn ResourceProvider, name: &str) -> Option<AssetHandle> {
    let handle = assets.load(name);
    if handle.is_none() {
        warn!(asset = name, "missing tile asset, drawing nothing");
    }
    handle
}

/// Width of a rectangular grid, or the first row that breaks it.
fn check_grid(rows: &[String]) -> Result<usize, LevelError> {
    let first = rows.first().ok_or(LevelError::Empty)?;
    let expected = first.chars().count();
    for (row, line) in rows.iter().enumerate().skip(1) {
        let found = line.chars().count();
        if found != expected {
            return Err(LevelError::RowLength { row, expected, found });
        }
    }
    Ok(expected)
}

// ══════════════════════════════════════════════════════════════
// Level lists
// ══════════════════════════════════════════════════════════════

/// Levels from `dir`, or the embedded set if the directory has none.
pub fn load_levels(dir: &Path) -> Vec<LevelDef> {
    let levels = load_from_directory(dir);
    if levels.is_empty() {
        info!(dir = %dir.display(), "no level files found, using built-in levels");
        return embedded_levels();
    }
    levels
}

pub fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let source = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    Ok(LevelDef::from_source(name, &source))
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == "txt"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match read_level_file(path).and_then(|def| def.validate().map(|_| def)) {
            Ok(def) => Some(def),
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping level file");
                None
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Meadow", &[
            "....................",
            "..............X.....",
            "...G.........##L#...",
            "..---....G.....L....",
            "...............L....",
            ".1.....A.......L..G.",
            "####################",
        ]),
        make_embedded("Crossing", &[
            "......................",
            "....................X.",
            "..G.........---...###.",
            "...........W..........",
            "....M......W.....P....",
            ".1......B..W....~~~~..",
            "####....##########:###",
        ]),
        make_embedded("Stacks", &[
            "..................X.",
            "...............L####",
            "..G............L....",
            "#####L####.....L..P.",
            ".....L.........L....",
            ".1...L...C..f..L..D.",
            "FFFF################",
        ]),
    ]
}

fn make_embedded(name: &str, rows: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: rows.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(rows: &[&str]) -> Result<Level, LevelError> {
        LevelLoader::new(7, ActorConfig::default()).load(&make_embedded("t", rows), &mut NameRegistry::new())
    }

    #[test]
    fn minimal_level_loads() {
        let level = load(&["1.X", "###"]).unwrap();
        assert_eq!(level.map.width(), 3);
        assert_eq!(level.map.height(), 2);
        assert_eq!(level.start, Vec2::new(20.0, 32.0));
        assert_eq!(level.exit, Vec2::new(100.0, 16.0));
        assert_eq!(level.map.classify(1, 1), TileCollision::Impassable);
    }

    #[test]
    fn start_and_exit_must_be_unique() {
        assert!(matches!(load(&["..X", "###"]), Err(LevelError::MissingStart)));
        assert!(matches!(load(&["1..", "###"]), Err(LevelError::MissingExit)));
        assert!(matches!(
            load(&["1.1X", "####"]),
            Err(LevelError::DuplicateStart { x: 2, y: 0 })
        ));
        assert!(matches!(
            load(&["1XX", "###"]),
            Err(LevelError::DuplicateExit { x: 2, y: 0 })
        ));
    }

    #[test]
    fn ragged_rows_report_first_offender() {
        let err = load(&["1.X", "###", "####", "##"]).unwrap_err();
        assert!(matches!(err, LevelError::RowLength { row: 2, expected: 3, found: 4 }));
    }

    #[test]
    fn unknown_character_reports_position() {
        let err = load(&["1.X", "#?#"]).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTile { ch: '?', x: 1, y: 1 }));
        assert!(err.to_string().contains("'?'"));
    }

    #[test]
    fn empty_source_is_rejected() {
        let def = LevelDef::from_source("blank", "\n\n");
        assert!(matches!(def.validate(), Err(LevelError::Empty)));
    }

    #[test]
    fn spawn_cells_and_their_collision() {
        let level = load(&["1GPAMWFfX", "#########"]).unwrap();
        let map = &level.map;
        assert_eq!(level.gems.len(), 2);
        assert_eq!(level.gems[0].points, 30);
        assert!(level.gems[1].power_up);
        assert_eq!(level.gems[1].points, 100);
        assert_eq!(level.enemies[0].position, Vec2::new(140.0, 32.0));
        assert_eq!(map.classify(3, 0), TileCollision::Passable);
        assert_eq!(level.movable_tiles[0].position, Vec2::new(180.0, 16.0));
        assert_eq!(map.classify(4, 0), TileCollision::Passable);
        assert_eq!(map.classify(5, 0), TileCollision::Impassable);
        assert_eq!(map.classify(6, 0), TileCollision::Impassable);
        assert_eq!(map.classify(7, 0), TileCollision::Passable);
        assert_eq!(level.props, vec![
            (PropKind::Floor, Vec2::new(260.0, 16.0)),
            (PropKind::Crate, Vec2::new(300.0, 16.0)),
        ]);
    }

    #[test]
    fn block_variants_resolve_to_named_assets() {
        let mut registry = NameRegistry::new();
        let level = LevelLoader::new(1, ActorConfig::default())
            .load(&make_embedded("t", &["1X~:", "####"]), &mut registry)
            .unwrap();
        for x in 0..4 {
            let handle = level.map.tile(x, 1).and_then(|t| t.visual).unwrap();
            assert!(registry.name_of(handle).unwrap().starts_with("Tiles/BlockA"));
        }
        let platform = level.map.tile(2, 0).and_then(|t| t.visual).unwrap();
        assert!(registry.name_of(platform).unwrap().starts_with("Tiles/BlockB"));
        assert_eq!(level.map.classify(2, 0), TileCollision::Platform);
        assert_eq!(level.map.classify(3, 0), TileCollision::Passable);
    }

    #[test]
    fn same_seed_same_visuals() {
        let def = make_embedded("t", &["1X########", "##########"]);
        let a = LevelLoader::new(3, ActorConfig::default()).load(&def, &mut NameRegistry::new()).unwrap();
        let b = LevelLoader::new(3, ActorConfig::default()).load(&def, &mut NameRegistry::new()).unwrap();
        let visuals = |l: &Level| (0..10).map(|x| l.map.tile(x, 1).and_then(|t| t.visual)).collect::<Vec<_>>();
        assert_eq!(visuals(&a), visuals(&b));
    }

    #[test]
    fn missing_assets_leave_cells_blank() {
        struct NoAssets;
        impl ResourceProvider for NoAssets {
            fn load(&mut self, _name: &str) -> Option<AssetHandle> {
                None
            }
        }
        let level = LevelLoader::new(0, ActorConfig::default())
            .load(&make_embedded("t", &["1X", "##"]), &mut NoAssets)
            .unwrap();
        assert_eq!(level.map.tile(0, 1).and_then(|t| t.visual), None);
        assert_eq!(level.map.classify(0, 1), TileCollision::Impassable);
    }

    #[test]
    fn source_round_trips() {
        let text = "1..X\r\n-L~:\r\n####\r\n\r\n\n";
        let def = LevelDef::from_source("rt", text);
        assert_eq!(def.rows, vec!["1..X", "-L~:", "####"]);
        assert_eq!(def.to_source(), "1..X\n-L~:\n####\n");
        assert_eq!(LevelDef::from_source("rt", &def.to_source()), def);
    }

    #[test]
    fn embedded_levels_are_valid() {
        for def in embedded_levels() {
            if let Err(err) = def.validate() {
                panic!("{}: {err}", def.name);
            }
        }
    }

    #[test]
    fn directory_levels_sorted_and_bad_files_skipped() {
        let dir = std::env::temp_dir().join(format!("ratiki-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("02_b.txt"), "1.X\n###\n").unwrap();
        std::fs::write(dir.join("01_a.txt"), "X.1\n###\n").unwrap();
        std::fs::write(dir.join("03_bad.txt"), "1.X\n##\n").unwrap();
        std::fs::write(dir.join("notes.md"), "not a level").unwrap();

        let levels = load_levels(&dir);
        let names: Vec<_> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["01_a", "02_b"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let levels = load_levels(Path::new("/nonexistent/ratiki/levels"));
        assert_eq!(levels.len(), embedded_levels().len());
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = read_level_file(Path::new("/nonexistent/ratiki/level.txt")).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
    }
}
