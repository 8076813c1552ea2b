pub mod artifact;
pub mod config;
pub mod error;
pub mod loader;
pub mod random;
pub mod render;
pub mod world;

pub use artifact::{ArtifactPaths, WorldData, read_artifacts, write_artifacts};
pub use config::{Adjacency, BuildConfig, RenderSettings};
pub use error::{Error, Result};
pub use loader::{InputPaths, RawData};
pub use random::{RandomSource, SeedRecord};
pub use render::{RenderOptions, render_png, render_svg};
pub use world::{BuildSummary, World, build_world};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::loader::{CityName, Grid, Land, RawData, Region, RegionArea};
    use std::path::Path;

    /// Карта из одних равнин
    pub fn plain_map(rows: usize, cols: usize) -> String {
        format!("{}\n", ".".repeat(cols)).repeat(rows)
    }

    /// `.` — равнина, `^` — горы (проходимы, вес 0), `~` — море
    pub fn raw_data(map: &str, regions: &[(&str, (u32, u32, u32, u32))]) -> RawData {
        let path = Path::new("worldmap.txt");
        let lands = vec![
            Land {
                name: "plain".into(),
                symbol: '.',
                passable: true,
                weight: 1,
                color: Some("#88aa55".into()),
            },
            Land {
                name: "mountain".into(),
                symbol: '^',
                passable: true,
                weight: 0,
                color: Some("#8a7f70".into()),
            },
            Land {
                name: "ocean".into(),
                symbol: '~',
                passable: false,
                weight: 0,
                color: Some("#1f3f7f".into()),
            },
        ];
        let cities = ["Drassa", "Pelun", "Ostrey"]
            .iter()
            .map(|n| CityName {
                name: (*n).to_string(),
            })
            .collect();
        let regions = regions
            .iter()
            .map(|&(name, (top, left, bottom, right))| Region {
                name: name.to_string(),
                area: RegionArea {
                    top,
                    left,
                    bottom,
                    right,
                },
            })
            .collect();
        let grid = Grid::parse(path, map).unwrap();
        RawData::new(path, grid, cities, lands, regions).unwrap()
    }
}
