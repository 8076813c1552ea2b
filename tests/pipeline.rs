use std::fs;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use worldmap::{
    ArtifactPaths, BuildConfig, Error, InputPaths, RandomSource, RawData, RenderOptions,
    SeedRecord, World, build_world, read_artifacts, render_png, write_artifacts,
};

const LANDS: &str = r##"[
  { "name": "plain", "symbol": ".", "weight": 2, "color": "#88aa55" },
  { "name": "forest", "symbol": "T", "color": "#2f6b2f" },
  { "name": "mountain", "symbol": "^", "weight": 0 },
  { "name": "ocean", "symbol": "~", "passable": false }
]
"##;

const CITIES: &str = r#"[
  { "name": "Drassa" },
  { "name": "Pelun" },
  { "name": "Ostrey" },
  { "name": "Varn" }
]
"#;

const REGIONS: &str = r#"[
  { "name": "North", "area": { "top": 0, "left": 0, "bottom": 5, "right": 39 } }
]
"#;

const ISLANDS: &str = "\
........~~~~~~~~~~~~..........~~~~~~~~~~
..TT....~~~~~~~~~~~~....TT....~~~~~~~~~~
..TT.^..~~~~~~~~~~~~..........~~~~......
........~~~~~~~~~~~~...^......~~~~......
......~~~~~~~~~~~~~~..........~~~~......
~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~......
~~~~~~~~~~..........~~~~~~~~~~~~~~......
~~~~~~~~~~....TT....~~~~~~~~~~~~~~~~~~~~
~~~~~~~~~~..........~~~~~~~~~~~~~~~~~~~~
~~~~~~~~~~..........~~~~~~~~~~~~~~~~~~~~
";

fn write_inputs(dir: &Path, map: &str) -> InputPaths {
    let paths = InputPaths {
        map: dir.join("worldmap.txt"),
        cities: dir.join("cities.json"),
        lands: dir.join("lands.json"),
        regions: dir.join("regions.json"),
    };
    fs::write(&paths.map, map).unwrap();
    fs::write(&paths.cities, CITIES).unwrap();
    fs::write(&paths.lands, LANDS).unwrap();
    fs::write(&paths.regions, REGIONS).unwrap();
    paths
}

fn config() -> BuildConfig {
    BuildConfig {
        min_continent_cells: 12,
        cells_per_location: 10,
        min_location_spacing: 2.0,
        gate_count: 4,
        ..BuildConfig::default()
    }
}

fn run(map: &str, config: &BuildConfig, rng: RandomSource) -> (TempDir, World, ArtifactPaths) {
    let dir = tempfile::tempdir().unwrap();
    let data = RawData::load(&write_inputs(dir.path(), map)).unwrap();
    let world = build_world(&data, config, rng);
    let outputs = ArtifactPaths::in_dir(dir.path());
    write_artifacts(&world, &outputs, true).unwrap();
    (dir, world, outputs)
}

fn artifact_bytes(paths: &ArtifactPaths) -> Vec<Vec<u8>> {
    [
        &paths.continents,
        &paths.locations,
        &paths.gates,
        &paths.roads,
        &paths.seed,
    ]
    .iter()
    .map(|p| fs::read(p).unwrap())
    .collect()
}

#[test]
fn same_seed_gives_identical_artifacts() {
    let (_a, _, first) = run(ISLANDS, &config(), RandomSource::new(42));
    let (_b, _, second) = run(ISLANDS, &config(), RandomSource::new(42));
    assert_eq!(artifact_bytes(&first), artifact_bytes(&second));
}

#[test]
fn restored_seed_reproduces_the_world() {
    let (_dir, original, paths) = run(ISLANDS, &config(), RandomSource::new(9));
    let record = SeedRecord::read_from(&paths.seed).unwrap();
    let (_dir2, replay, _) = run(ISLANDS, &config(), RandomSource::restore(&record).unwrap());

    assert_eq!(original.continents(), replay.continents());
    assert_eq!(original.locations(), replay.locations());
    assert_eq!(original.roads(), replay.roads());
    assert_eq!(original.gates(), replay.gates());
}

#[test]
fn written_world_satisfies_graph_invariants() {
    let (_dir, world, paths) = run(ISLANDS, &config(), RandomSource::new(5));
    let data = read_artifacts(&paths).unwrap();
    assert!(data.verify().is_empty(), "{:?}", data.verify());

    assert_eq!(world.continents().len(), 4);
    for loc in world.locations() {
        assert!(loc.row < world.rows() && loc.col < world.cols());
        assert_eq!(world.continent_at(loc.row, loc.col), Some(loc.continent));
        let land = world.land_at(loc.row, loc.col);
        assert!(land.passable && land.weight > 0, "{loc:?}");
        let expected = if loc.row <= 5 { "North" } else { "unregioned" };
        assert_eq!(loc.region, expected);
    }

    // Каждый континент связен по дорогам
    for continent in world.continents() {
        assert!(continent.cells >= 12);
        let n = continent.location_ids.len();
        let roads = world.roads().iter().filter(|r| r.continent == continent.id);
        assert!(roads.count() >= n.saturating_sub(1));
    }

    let mut seen = std::collections::HashSet::new();
    for gate in world.gates() {
        assert!(gate.from < gate.to);
        assert!(seen.insert((gate.from, gate.to)));
        assert!(
            !world
                .roads()
                .iter()
                .any(|r| (r.from, r.to) == (gate.from, gate.to))
        );
    }
}

#[test]
fn open_field_is_one_continent() {
    let map = format!("{}\n", ".".repeat(10)).repeat(10);
    let (_dir, world, _) = run(&map, &config(), RandomSource::new(1));

    assert_eq!(world.continents().len(), 1);
    let continent = &world.continents()[0];
    assert_eq!(continent.cells, 100);
    assert_eq!(
        (continent.bounds.top, continent.bounds.left),
        (0, 0)
    );
    assert_eq!(
        (continent.bounds.bottom, continent.bounds.right),
        (9, 9)
    );
    assert_eq!(world.summary().discarded_components, 0);
}

#[test]
fn small_islands_leave_an_empty_world() {
    let map = "..~~~..\n..~~~..\n";
    let (_dir, world, paths) = run(map, &config(), RandomSource::new(1));

    assert!(world.continents().is_empty());
    assert!(world.locations().is_empty());
    assert_eq!(world.summary().discarded_components, 2);
    assert_eq!(world.summary().discarded_cells, 8);

    let data = read_artifacts(&paths).unwrap();
    assert!(data.continents.is_empty());
    assert!(data.gates.is_empty());
    assert!(data.roads.is_empty());
}

#[test]
fn gate_shortfall_is_counted() {
    // Два острова по одной локации: возможна только одна пара для врат
    let map = "....~~....\n....~~....\n....~~....\n....~~....\n";
    let config = BuildConfig {
        cells_per_location: 100,
        gate_count: 5,
        ..config()
    };
    let (_dir, world, _) = run(map, &config, RandomSource::new(3));

    assert_eq!(world.locations().len(), 2);
    assert!(world.roads().is_empty());
    assert_eq!(world.gates().len(), 1);
    assert_eq!(world.summary().gate_shortfall, 4);
    assert_eq!(world.summary().gate_shortfall, 5 - world.gates().len());
}

#[test]
fn missing_input_is_reported_by_path() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), ISLANDS);
    fs::remove_file(&paths.cities).unwrap();

    match RawData::load(&paths) {
        Err(Error::MissingFile { path }) => assert_eq!(path, paths.cities),
        other => panic!("expected MissingFile, got {other:?}"),
    }
}

#[test]
fn ragged_map_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), "....\n...\n....\n");

    match RawData::load(&paths) {
        Err(Error::MalformedInput { path, line, .. }) => {
            assert_eq!(path, paths.map);
            assert_eq!(line, 2);
        }
        other => panic!("expected MalformedInput, got {other:?}"),
    }
}

#[test]
fn unknown_symbol_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), "....\n..#.\n");

    assert!(matches!(
        RawData::load(&paths),
        Err(Error::MalformedInput { line: 2, .. })
    ));
}

#[test]
fn render_timeout_keeps_artifacts() {
    let (dir, world, paths) = run(ISLANDS, &config(), RandomSource::new(11));
    let before = artifact_bytes(&paths);
    let png = dir.path().join("worldmap.png");

    let options = RenderOptions {
        deadline: Some(Instant::now()),
        ..RenderOptions::default()
    };
    assert!(matches!(
        render_png(&world, &options, &png),
        Err(Error::RenderTimeout { .. })
    ));
    assert!(!png.exists());
    assert_eq!(artifact_bytes(&paths), before);
    assert!(read_artifacts(&paths).unwrap().verify().is_empty());
}
