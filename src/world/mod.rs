// src/world/mod.rs
//! Граф мира: континенты, локации, дороги и врата
//!
//! Все сущности хранятся в плотных векторах, идентификатор сущности равен её
//! индексу. Дороги и врата — пары идентификаторов локаций, без ссылок.
//!
//! ## Порядок построения
//!
//! `Loaded → ContinentsAssigned → LocationsPlaced → RoadsBuilt → GatesInserted → World`
//!
//! Переходы закреплены типами [`WorldBuilder`]: пропустить или переставить стадию нельзя.
//!
//! ## Пример
//! ```rust,ignore
//! let data = RawData::load(&InputPaths::default())?;
//! let world = build_world(&data, &BuildConfig::default(), RandomSource::new(42));
//! println!("{} континентов", world.continents().len());
//! ```

pub mod builder;
pub mod continent;
pub mod gates;
pub mod placement;
pub mod roads;

pub use builder::{
    ContinentsAssigned, GatesInserted, Loaded, LocationsPlaced, RoadsBuilt, Stage, WorldBuilder,
};

use crate::config::BuildConfig;
use crate::loader::{Land, RawData};
use crate::random::{RandomSource, SeedRecord};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

/// Метка региона для локаций вне всех объявленных регионов
pub const UNREGIONED: &str = "unregioned";

/// Ограничивающий прямоугольник, границы включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    pub id: u32,
    pub name: String,
    /// Площадь в клетках
    pub cells: usize,
    pub bounds: Bounds,
    pub location_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u32,
    pub continent: u32,
    pub row: u32,
    pub col: u32,
    /// Тип земли клетки
    pub terrain: String,
    /// Имя региона или [`UNREGIONED`]
    pub region: String,
}

/// Дорога между двумя локациями одного континента, `from < to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: u32,
    pub continent: u32,
    pub from: u32,
    pub to: u32,
    /// Евклидово расстояние в клетках, округлённое до тысячных
    pub length: f64,
}

/// Врата: внегеографический переход между двумя локациями, `from < to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub id: u32,
    pub from: u32,
    pub to: u32,
}

/// Итоги построения
///
/// Нехватка мест (`placement_shortfall`, `gate_shortfall`) — предупреждение, не ошибка.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub continents: usize,
    pub discarded_components: usize,
    pub discarded_cells: usize,
    pub locations: usize,
    pub roads: usize,
    pub gates: usize,
    pub placement_shortfall: usize,
    pub gate_shortfall: usize,
}

impl BuildSummary {
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.placement_shortfall + self.gate_shortfall
    }
}

/// Готовый мир. После финализации только читается.
#[derive(Debug, Clone)]
pub struct World {
    rows: u32,
    cols: u32,
    lands: Vec<Land>,
    terrain: Vec<usize>,
    cell_continent: Vec<Option<u32>>,
    continents: Vec<Continent>,
    locations: Vec<Location>,
    roads: Vec<Road>,
    gates: Vec<Gate>,
    seed: SeedRecord,
    summary: BuildSummary,
}

impl World {
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub fn lands(&self) -> &[Land] {
        &self.lands
    }

    /// Тип земли клетки
    #[must_use]
    pub fn land_at(&self, row: u32, col: u32) -> &Land {
        &self.lands[self.terrain[(row * self.cols + col) as usize]]
    }

    /// Континент, которому принадлежит клетка (`None` для воды и отсеянных островков)
    #[must_use]
    pub fn continent_at(&self, row: u32, col: u32) -> Option<u32> {
        self.cell_continent[(row * self.cols + col) as usize]
    }

    #[must_use]
    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Запись сида, с которой начиналось построение
    #[must_use]
    pub fn seed(&self) -> &SeedRecord {
        &self.seed
    }

    #[must_use]
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Граф дорог: индекс вершины равен идентификатору локации
    #[must_use]
    pub fn road_graph(&self) -> UnGraph<u32, f64> {
        road_graph(self.locations.len(), self.roads.iter().map(|r| (r.from, r.to, r.length)))
    }
}

pub(crate) fn road_graph(
    nodes: usize,
    edges: impl Iterator<Item = (u32, u32, f64)>,
) -> UnGraph<u32, f64> {
    let mut graph = UnGraph::with_capacity(nodes, 0);
    for id in 0..nodes {
        graph.add_node(id as u32);
    }
    for (from, to, length) in edges {
        graph.add_edge(
            NodeIndex::new(from as usize),
            NodeIndex::new(to as usize),
            length,
        );
    }
    graph
}

/// Проходит все стадии построения подряд
#[must_use]
pub fn build_world(data: &RawData, config: &BuildConfig, rng: RandomSource) -> World {
    WorldBuilder::new(data, config, rng)
        .assign_continents()
        .place_locations()
        .build_roads()
        .insert_gates()
        .finalize()
}
