// src/world/builder.rs
//! Пошаговое построение мира
//!
//! Каждая стадия — отдельный тип-маркер. Метод стадии потребляет строитель и
//! возвращает строитель следующей стадии, так что порядок
//! `Loaded → ContinentsAssigned → LocationsPlaced → RoadsBuilt → GatesInserted`
//! проверяется компилятором. [`WorldBuilder::finalize`] отдаёт неизменяемый [`World`].
//!
//! Основной генератор используется для имён континентов и врат. Размещение
//! локаций на континенте `id` идёт по подпоследовательности
//! `seed.derive("placement", id)`, поэтому параллельная и последовательная
//! сборки дают один и тот же мир.

use crate::config::BuildConfig;
use crate::loader::RawData;
use crate::random::{RandomSource, SeedRecord};
use crate::world::continent::{bounds_of, draw_names, label_landmasses};
use crate::world::gates::draw_gates;
use crate::world::placement::{Placement, place_sites};
use crate::world::roads::connect;
use crate::world::{BuildSummary, Continent, Gate, Location, Road, UNREGIONED, World};
use std::collections::HashSet;
use std::marker::PhantomData;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub trait Stage {
    const NAME: &'static str;
}

pub struct Loaded;
pub struct ContinentsAssigned;
pub struct LocationsPlaced;
pub struct RoadsBuilt;
pub struct GatesInserted;

impl Stage for Loaded {
    const NAME: &'static str = "loaded";
}
impl Stage for ContinentsAssigned {
    const NAME: &'static str = "continents-assigned";
}
impl Stage for LocationsPlaced {
    const NAME: &'static str = "locations-placed";
}
impl Stage for RoadsBuilt {
    const NAME: &'static str = "roads-built";
}
impl Stage for GatesInserted {
    const NAME: &'static str = "gates-inserted";
}

pub struct WorldBuilder<'a, S: Stage> {
    data: &'a RawData,
    config: &'a BuildConfig,
    rng: RandomSource,
    seed: SeedRecord,
    cell_continent: Vec<Option<u32>>,
    continents: Vec<Continent>,
    continent_cells: Vec<Vec<usize>>,
    locations: Vec<Location>,
    roads: Vec<Road>,
    gates: Vec<Gate>,
    summary: BuildSummary,
    _stage: PhantomData<S>,
}

impl<'a, S: Stage> WorldBuilder<'a, S> {
    #[must_use]
    pub fn stage(&self) -> &'static str {
        S::NAME
    }

    #[must_use]
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    fn advance<T: Stage>(self) -> WorldBuilder<'a, T> {
        tracing::debug!(from = S::NAME, to = T::NAME, "стадия построения");
        WorldBuilder {
            data: self.data,
            config: self.config,
            rng: self.rng,
            seed: self.seed,
            cell_continent: self.cell_continent,
            continents: self.continents,
            continent_cells: self.continent_cells,
            locations: self.locations,
            roads: self.roads,
            gates: self.gates,
            summary: self.summary,
            _stage: PhantomData,
        }
    }
}

impl<'a> WorldBuilder<'a, Loaded> {
    /// Фиксирует состояние генератора как запись сида этого мира
    #[must_use]
    pub fn new(data: &'a RawData, config: &'a BuildConfig, rng: RandomSource) -> Self {
        let seed = rng.state();
        Self {
            data,
            config,
            rng,
            seed,
            cell_continent: vec![None; data.grid.len()],
            continents: Vec::new(),
            continent_cells: Vec::new(),
            locations: Vec::new(),
            roads: Vec::new(),
            gates: Vec::new(),
            summary: BuildSummary::default(),
            _stage: PhantomData,
        }
    }

    /// Заливка массивов суши, отсев мелких, выдача имён
    #[must_use]
    pub fn assign_continents(mut self) -> WorldBuilder<'a, ContinentsAssigned> {
        let min_cells = self.config.min_continent_cells;
        let (kept, discarded): (Vec<_>, Vec<_>) =
            label_landmasses(self.data, self.config.adjacency)
                .into_iter()
                .partition(|cells| cells.len() >= min_cells);

        self.summary.discarded_components = discarded.len();
        self.summary.discarded_cells = discarded.iter().map(Vec::len).sum();

        let names = draw_names(
            kept.len(),
            &self.data.cities,
            &self.config.synthetic_name_prefix,
            &mut self.rng,
        );

        for (id, (cells, name)) in kept.into_iter().zip(names).enumerate() {
            let id = id as u32;
            for &idx in &cells {
                self.cell_continent[idx] = Some(id);
            }
            self.continents.push(Continent {
                id,
                name,
                cells: cells.len(),
                bounds: bounds_of(self.data, &cells),
                location_ids: Vec::new(),
            });
            self.continent_cells.push(cells);
        }

        tracing::info!(
            continents = self.continents.len(),
            discarded = self.summary.discarded_components,
            "континенты выделены"
        );
        self.advance()
    }
}

impl<'a> WorldBuilder<'a, ContinentsAssigned> {
    /// Размещение локаций и привязка к регионам
    #[must_use]
    pub fn place_locations(mut self) -> WorldBuilder<'a, LocationsPlaced> {
        let placements = place_all(self.data, &self.continent_cells, self.config, &self.seed);

        for (continent_id, placement) in placements.into_iter().enumerate() {
            let shortfall = placement.shortfall();
            if shortfall > 0 {
                tracing::debug!(
                    continent = continent_id,
                    target = placement.target,
                    shortfall,
                    "не все локации размещены"
                );
            }
            self.summary.placement_shortfall += shortfall;

            for idx in placement.sites {
                let (row, col) = self.data.grid.coords(idx);
                let id = self.locations.len() as u32;
                let region = self
                    .data
                    .region_at(row, col)
                    .map_or(UNREGIONED, |r| r.name.as_str());
                self.locations.push(Location {
                    id,
                    continent: continent_id as u32,
                    row,
                    col,
                    terrain: self.data.lands[self.data.terrain[idx]].name.clone(),
                    region: region.to_string(),
                });
                self.continents[continent_id].location_ids.push(id);
            }
        }

        if self.summary.placement_shortfall > 0 {
            tracing::warn!(
                shortfall = self.summary.placement_shortfall,
                "бюджет попыток размещения исчерпан"
            );
        }
        tracing::info!(locations = self.locations.len(), "локации размещены");
        self.advance()
    }
}

fn place_all(
    data: &RawData,
    continent_cells: &[Vec<usize>],
    config: &BuildConfig,
    seed: &SeedRecord,
) -> Vec<Placement> {
    let place = |(id, cells): (usize, &Vec<usize>)| {
        let mut rng = seed.derive("placement", id as u64);
        place_sites(data, cells, config, &mut rng)
    };

    #[cfg(feature = "parallel")]
    let placements: Vec<Placement> = continent_cells.par_iter().enumerate().map(place).collect();
    #[cfg(not(feature = "parallel"))]
    let placements: Vec<Placement> = continent_cells.iter().enumerate().map(place).collect();

    placements
}

impl<'a> WorldBuilder<'a, LocationsPlaced> {
    /// Остовное дерево плюс избыточные дороги на каждом континенте
    #[must_use]
    pub fn build_roads(mut self) -> WorldBuilder<'a, RoadsBuilt> {
        for continent in &self.continents {
            // Локации континента идут подряд
            let Some(&first) = continent.location_ids.first() else {
                continue;
            };
            let start = first as usize;
            let members = &self.locations[start..start + continent.location_ids.len()];

            for edge in connect(members, self.config.road_density) {
                self.roads.push(Road {
                    id: self.roads.len() as u32,
                    continent: continent.id,
                    from: edge.from,
                    to: edge.to,
                    length: edge.length(),
                });
            }
        }

        tracing::info!(roads = self.roads.len(), "дороги проложены");
        self.advance()
    }
}

impl<'a> WorldBuilder<'a, RoadsBuilt> {
    #[must_use]
    pub fn insert_gates(mut self) -> WorldBuilder<'a, GatesInserted> {
        let road_pairs: HashSet<(u32, u32)> = self.roads.iter().map(|r| (r.from, r.to)).collect();
        let draw = draw_gates(
            self.locations.len(),
            &road_pairs,
            self.config.gate_count,
            self.config.gate_attempts_per_gate,
            &mut self.rng,
        );

        self.gates = draw
            .pairs
            .into_iter()
            .enumerate()
            .map(|(id, (from, to))| Gate {
                id: id as u32,
                from,
                to,
            })
            .collect();
        self.summary.gate_shortfall = draw.shortfall;

        if draw.shortfall > 0 {
            tracing::warn!(
                requested = self.config.gate_count,
                shortfall = draw.shortfall,
                "врат меньше, чем запрошено"
            );
        }
        tracing::info!(gates = self.gates.len(), "врата установлены");
        self.advance()
    }
}

impl WorldBuilder<'_, GatesInserted> {
    #[must_use]
    pub fn finalize(mut self) -> World {
        self.summary.continents = self.continents.len();
        self.summary.locations = self.locations.len();
        self.summary.roads = self.roads.len();
        self.summary.gates = self.gates.len();

        World {
            rows: self.data.grid.rows,
            cols: self.data.grid.cols,
            lands: self.data.lands.clone(),
            terrain: self.data.terrain.clone(),
            cell_continent: self.cell_continent,
            continents: self.continents,
            locations: self.locations,
            roads: self.roads,
            gates: self.gates,
            seed: self.seed,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{plain_map, raw_data};

    #[test]
    fn stages_report_their_names() {
        let data = raw_data(&plain_map(4, 4), &[]);
        let config = BuildConfig::default();
        let builder = WorldBuilder::new(&data, &config, RandomSource::new(1));
        assert_eq!(builder.stage(), "loaded");
        let builder = builder.assign_continents();
        assert_eq!(builder.stage(), "continents-assigned");
        assert_eq!(builder.summary().discarded_components, 0);
        let builder = builder.place_locations().build_roads().insert_gates();
        assert_eq!(builder.stage(), "gates-inserted");
    }

    #[test]
    fn seed_record_is_taken_before_any_draw() {
        let data = raw_data(&plain_map(6, 6), &[]);
        let config = BuildConfig::default();
        let rng = RandomSource::new(77);
        let expected = rng.state();
        let world = WorldBuilder::new(&data, &config, rng)
            .assign_continents()
            .place_locations()
            .build_roads()
            .insert_gates()
            .finalize();
        assert_eq!(world.seed(), &expected);
    }

    #[test]
    fn placement_matches_sequential_run() {
        let map = "\
......~~......
......~~......
~~~~~~~~~~~~~~
.........~~...
.........~~...
";
        let data = raw_data(map, &[]);
        let config = BuildConfig {
            min_continent_cells: 4,
            cells_per_location: 4,
            min_location_spacing: 1.5,
            ..BuildConfig::default()
        };
        let seed = RandomSource::new(31).state();
        let masses = label_landmasses(&data, config.adjacency);
        assert_eq!(masses.len(), 4);

        let sequential: Vec<Placement> = masses
            .iter()
            .enumerate()
            .map(|(id, cells)| {
                let mut rng = seed.derive("placement", id as u64);
                place_sites(&data, cells, &config, &mut rng)
            })
            .collect();
        assert_eq!(place_all(&data, &masses, &config, &seed), sequential);
    }

    #[test]
    fn locations_carry_region_names() {
        let data = raw_data(&plain_map(10, 10), &[("West", (0, 0, 9, 4))]);
        let config = BuildConfig {
            cells_per_location: 5,
            min_location_spacing: 1.0,
            ..BuildConfig::default()
        };
        let world = crate::world::build_world(&data, &config, RandomSource::new(5));
        assert!(!world.locations().is_empty());
        for loc in world.locations() {
            let expected = if loc.col <= 4 { "West" } else { UNREGIONED };
            assert_eq!(loc.region, expected);
        }
    }
}
