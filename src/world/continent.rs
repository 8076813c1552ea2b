// src/world/continent.rs
use crate::config::Adjacency;
use crate::loader::{CityName, RawData};
use crate::random::RandomSource;
use crate::world::Bounds;
use std::collections::VecDeque;

/// Связные массивы проходимых клеток
///
/// Обход идёт по строкам, поэтому массивы упорядочены по первой встреченной клетке.
/// Клетки внутри массива отсортированы по индексу.
pub fn label_landmasses(data: &RawData, adjacency: Adjacency) -> Vec<Vec<usize>> {
    let total = data.grid.len();
    let offsets = adjacency.offsets();
    let mut visited = vec![false; total];
    let mut landmasses = Vec::new();

    for start in 0..total {
        if visited[start] || !data.is_passable(start) {
            continue;
        }

        let mut cells = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited[start] = true;

        while let Some(idx) = queue.pop_front() {
            cells.push(idx);
            for n in data.grid.neighbors(idx, offsets) {
                if !visited[n] && data.is_passable(n) {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }

        cells.sort_unstable();
        landmasses.push(cells);
    }
    landmasses
}

/// Имена для `count` континентов: без возвращения из пула городов,
/// затем `"{prefix}{id}"`.
pub fn draw_names(
    count: usize,
    pool: &[CityName],
    prefix: &str,
    rng: &mut RandomSource,
) -> Vec<String> {
    let mut pool: Vec<&str> = pool.iter().map(|c| c.name.as_str()).collect();
    (0..count)
        .map(|id| {
            if pool.is_empty() {
                format!("{prefix}{id}")
            } else {
                let i = rng.below(pool.len() as u64) as usize;
                pool.remove(i).to_string()
            }
        })
        .collect()
}

pub fn bounds_of(data: &RawData, cells: &[usize]) -> Bounds {
    let mut bounds = Bounds {
        top: u32::MAX,
        left: u32::MAX,
        bottom: 0,
        right: 0,
    };
    for &idx in cells {
        let (row, col) = data.grid.coords(idx);
        bounds.top = bounds.top.min(row);
        bounds.left = bounds.left.min(col);
        bounds.bottom = bounds.bottom.max(row);
        bounds.right = bounds.right.max(col);
    }
    bounds
}
