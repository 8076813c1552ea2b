// src/world/gates.rs
use crate::random::RandomSource;
use std::collections::HashSet;

/// Результат жеребьёвки врат
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDraw {
    /// Пары `(from, to)`, `from < to`, в порядке выпадения
    pub pairs: Vec<(u32, u32)>,
    pub shortfall: usize,
}

/// Тянет `count` неупорядоченных пар локаций
///
/// Пара отклоняется, если концы совпадают, уже соединены дорогой или уже
/// соединены вратами. Остановка — по числу врат, по бюджету
/// `count * attempts_per_gate` или когда допустимых пар не осталось.
pub fn draw_gates(
    location_count: usize,
    road_pairs: &HashSet<(u32, u32)>,
    count: usize,
    attempts_per_gate: usize,
    rng: &mut RandomSource,
) -> GateDraw {
    let mut pairs = Vec::with_capacity(count);
    if location_count < 2 {
        return GateDraw {
            pairs,
            shortfall: count,
        };
    }

    let n = location_count as u64;
    let available = (location_count * (location_count - 1) / 2).saturating_sub(road_pairs.len());
    let budget = count.saturating_mul(attempts_per_gate);

    let mut gated = HashSet::new();
    let mut attempts = 0;
    while pairs.len() < count && gated.len() < available && attempts < budget {
        attempts += 1;
        let a = rng.below(n) as u32;
        let b = rng.below(n) as u32;
        if a == b {
            continue;
        }
        let pair = (a.min(b), a.max(b));
        if road_pairs.contains(&pair) || !gated.insert(pair) {
            continue;
        }
        pairs.push(pair);
    }

    GateDraw {
        shortfall: count - pairs.len(),
        pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_avoid_roads_and_repeats() {
        let roads: HashSet<(u32, u32)> = [(0, 1), (1, 2), (2, 3)].into_iter().collect();
        let draw = draw_gates(6, &roads, 8, 50, &mut RandomSource::new(4));
        let unique: HashSet<_> = draw.pairs.iter().copied().collect();
        assert_eq!(unique.len(), draw.pairs.len());
        for pair in &draw.pairs {
            assert!(pair.0 < pair.1);
            assert!(!roads.contains(pair));
        }
        assert_eq!(draw.shortfall, 8 - draw.pairs.len());
    }

    #[test]
    fn exhausted_pairs_end_the_draw() {
        // Три локации, две дороги — свободна лишь пара (0, 2)
        let roads: HashSet<(u32, u32)> = [(0, 1), (1, 2)].into_iter().collect();
        let draw = draw_gates(3, &roads, 5, 1000, &mut RandomSource::new(9));
        assert_eq!(draw.pairs, vec![(0, 2)]);
        assert_eq!(draw.shortfall, 4);
    }

    #[test]
    fn lone_location_gets_no_gates() {
        let draw = draw_gates(1, &HashSet::new(), 3, 10, &mut RandomSource::new(1));
        assert!(draw.pairs.is_empty());
        assert_eq!(draw.shortfall, 3);
    }
}
