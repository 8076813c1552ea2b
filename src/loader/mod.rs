pub mod grid;
pub mod records;

pub use grid::{Grid, GridCell, load_map};
pub use records::{CityName, Land, Region, RegionArea, load_cities, load_lands, load_regions};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Пути к четырём входным файлам
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub map: PathBuf,
    pub cities: PathBuf,
    pub lands: PathBuf,
    pub regions: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            map: PathBuf::from("worldmap.txt"),
            cities: PathBuf::from("cities.json"),
            lands: PathBuf::from("lands.json"),
            regions: PathBuf::from("regions.json"),
        }
    }
}

/// Все входные данные, прошедшие проверку
#[derive(Debug, Clone)]
pub struct RawData {
    pub grid: Grid,
    pub cities: Vec<CityName>,
    pub lands: Vec<Land>,
    pub regions: Vec<Region>,
    /// Индекс типа земли для каждой клетки сетки
    pub terrain: Vec<usize>,
}

impl RawData {
    /// Собирает данные из уже разобранных частей и сверяет символы карты с типами земли.
    ///
    /// `map_path` нужен только для сообщения об ошибке.
    pub fn new(
        map_path: &std::path::Path,
        grid: Grid,
        cities: Vec<CityName>,
        lands: Vec<Land>,
        regions: Vec<Region>,
    ) -> Result<Self> {
        let by_symbol: HashMap<char, usize> = lands
            .iter()
            .enumerate()
            .map(|(i, l)| (l.symbol, i))
            .collect();

        let mut terrain = Vec::with_capacity(grid.len());
        for cell in grid.cells() {
            let Some(&land) = by_symbol.get(&cell.symbol) else {
                return Err(Error::malformed(
                    map_path,
                    cell.row as usize + 1,
                    format!(
                        "symbol {:?} at column {} is not a declared land",
                        cell.symbol,
                        cell.col + 1
                    ),
                ));
            };
            terrain.push(land);
        }

        Ok(Self {
            grid,
            cities,
            lands,
            regions,
            terrain,
        })
    }

    /// Загружает все четыре файла; первая же ошибка прерывает загрузку
    pub fn load(paths: &InputPaths) -> Result<Self> {
        let grid = load_map(&paths.map)?;
        let cities = load_cities(&paths.cities)?;
        let lands = load_lands(&paths.lands)?;
        let regions = load_regions(&paths.regions)?;
        tracing::info!(
            rows = grid.rows,
            cols = grid.cols,
            cities = cities.len(),
            lands = lands.len(),
            regions = regions.len(),
            "входные данные загружены"
        );
        Self::new(&paths.map, grid, cities, lands, regions)
    }

    #[must_use]
    pub fn is_passable(&self, idx: usize) -> bool {
        self.lands[self.terrain[idx]].passable
    }

    /// Имя первого региона, содержащего клетку
    #[must_use]
    pub fn region_at(&self, row: u32, col: u32) -> Option<&Region> {
        self.regions.iter().find(|r| r.area.contains(row, col))
    }
}
