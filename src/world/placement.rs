// src/world/placement.rs
use crate::config::BuildConfig;
use crate::loader::RawData;
use crate::random::RandomSource;

/// Результат размещения на одном континенте
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Индексы клеток в порядке размещения
    pub sites: Vec<usize>,
    pub target: usize,
}

impl Placement {
    #[must_use]
    pub fn shortfall(&self) -> usize {
        self.target - self.sites.len()
    }
}

/// Сколько локаций должно быть на континенте площадью `cells`
#[must_use]
pub fn target_count(cells: usize, config: &BuildConfig) -> usize {
    cells.div_ceil(config.cells_per_location.max(1)).max(1)
}

/// Выборка с отказами: клетка берётся с вероятностью, пропорциональной весу её
/// типа земли, и отклоняется, если ближе `min_location_spacing` к уже
/// поставленной локации. Исчерпание бюджета попыток — не ошибка.
pub fn place_sites(
    data: &RawData,
    cells: &[usize],
    config: &BuildConfig,
    rng: &mut RandomSource,
) -> Placement {
    let target = target_count(cells.len(), config);
    let mut sites = Vec::with_capacity(target);

    // Накопленные веса для выборки одним числом
    let mut cumulative = Vec::with_capacity(cells.len());
    let mut total: u64 = 0;
    for &idx in cells {
        total += u64::from(data.lands[data.terrain[idx]].weight);
        cumulative.push(total);
    }
    if total == 0 {
        return Placement { sites, target };
    }

    let budget = target.saturating_mul(config.placement_attempts_per_location);
    let min_d2 = config.min_location_spacing.max(0.0).powi(2);

    let mut attempts = 0;
    while sites.len() < target && attempts < budget {
        attempts += 1;
        let r = rng.below(total);
        let idx = cells[cumulative.partition_point(|&c| c <= r)];
        let (row, col) = data.grid.coords(idx);

        let blocked = sites.iter().any(|&s| {
            let (sr, sc) = data.grid.coords(s);
            s == idx || (distance_sq(row, col, sr, sc) as f64) < min_d2
        });
        if !blocked {
            sites.push(idx);
        }
    }

    Placement { sites, target }
}

#[must_use]
pub fn distance_sq(r1: u32, c1: u32, r2: u32, c2: u32) -> u64 {
    let dr = i64::from(r1) - i64::from(r2);
    let dc = i64::from(c1) - i64::from(c2);
    (dr * dr + dc * dc) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Adjacency;
    use crate::test_support::{plain_map, raw_data};
    use crate::world::continent::label_landmasses;

    #[test]
    fn sites_respect_spacing() {
        let data = raw_data(&plain_map(20, 20), &[]);
        let cells: Vec<usize> = (0..data.grid.len()).collect();
        let config = BuildConfig {
            cells_per_location: 10,
            min_location_spacing: 4.0,
            ..BuildConfig::default()
        };
        let placement = place_sites(&data, &cells, &config, &mut RandomSource::new(1));
        assert_eq!(placement.target, 40);
        for (i, &a) in placement.sites.iter().enumerate() {
            for &b in &placement.sites[i + 1..] {
                let (ar, ac) = data.grid.coords(a);
                let (br, bc) = data.grid.coords(b);
                assert!(distance_sq(ar, ac, br, bc) >= 16);
            }
        }
        assert_eq!(
            placement.shortfall(),
            placement.target - placement.sites.len()
        );
    }

    #[test]
    fn spacing_is_a_strict_lower_bound() {
        // Средняя клетка — горы с нулевым весом, доступны только края
        let data = raw_data(".^.\n", &[]);
        let cells = vec![0, 1, 2];
        let mut config = BuildConfig {
            cells_per_location: 1,
            min_location_spacing: 2.0,
            ..BuildConfig::default()
        };
        let mut sites = place_sites(&data, &cells, &config, &mut RandomSource::new(4)).sites;
        sites.sort_unstable();
        assert_eq!(sites, vec![0, 2]);

        config.min_location_spacing = 2.1;
        let placement = place_sites(&data, &cells, &config, &mut RandomSource::new(4));
        assert_eq!(placement.sites.len(), 1);
        assert_eq!(placement.shortfall(), 2);
    }

    #[test]
    fn crowded_continent_reports_shortfall() {
        let data = raw_data("...\n...\n...\n", &[]);
        let cells: Vec<usize> = (0..9).collect();
        let config = BuildConfig {
            cells_per_location: 1,
            min_location_spacing: 10.0,
            ..BuildConfig::default()
        };
        let placement = place_sites(&data, &cells, &config, &mut RandomSource::new(2));
        assert_eq!(placement.sites.len(), 1);
        assert_eq!(placement.shortfall(), 8);
    }

    #[test]
    fn zero_weight_cells_are_never_chosen() {
        // '^' — проходимые горы с нулевым весом
        let data = raw_data("^^^.\n^^^^\n", &[]);
        let masses = label_landmasses(&data, Adjacency::Four);
        let config = BuildConfig {
            cells_per_location: 1,
            min_location_spacing: 0.0,
            ..BuildConfig::default()
        };
        let placement = place_sites(&data, &masses[0], &config, &mut RandomSource::new(3));
        assert_eq!(placement.sites, vec![3]);
        assert_eq!(placement.shortfall(), 7);
    }

    #[test]
    fn same_stream_same_sites() {
        let data = raw_data(&plain_map(12, 12), &[]);
        let cells: Vec<usize> = (0..data.grid.len()).collect();
        let config = BuildConfig::default();
        let a = place_sites(&data, &cells, &config, &mut RandomSource::new(8));
        let b = place_sites(&data, &cells, &config, &mut RandomSource::new(8));
        assert_eq!(a, b);
    }
}
