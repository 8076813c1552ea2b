// src/world/roads.rs
use crate::world::Location;
use crate::world::placement::distance_sq;
use std::collections::{BinaryHeap, HashSet};

/// Ребро-кандидат: квадрат расстояния и пара идентификаторов, `from < to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoadEdge {
    pub distance_sq: u64,
    pub from: u32,
    pub to: u32,
}

impl RoadEdge {
    #[must_use]
    pub fn length(&self) -> f64 {
        ((self.distance_sq as f64).sqrt() * 1000.0).round() / 1000.0
    }
}

fn edge_between(a: &Location, b: &Location) -> RoadEdge {
    RoadEdge {
        distance_sq: distance_sq(a.row, a.col, b.row, b.col),
        from: a.id.min(b.id),
        to: a.id.max(b.id),
    }
}

/// Дороги одного континента
///
/// Минимальное остовное дерево по порядку рёбер `(distance_sq, from, to)`,
/// затем самые короткие из оставшихся пар — `round((n - 1) * density)` штук.
/// Порядок рёбер строгий, так что дерево единственно. Пары не хранятся:
/// дерево строится алгоритмом Прима за O(n²) по времени и O(n) по памяти,
/// лишние дороги отбираются в куче размера `extra`.
pub fn connect(locations: &[Location], density: f32) -> Vec<RoadEdge> {
    let n = locations.len();
    if n < 2 {
        return Vec::new();
    }

    let mut tree = spanning_tree(locations);
    tree.sort_unstable();

    let extra = ((n - 1) as f32 * density.max(0.0)).round() as usize;
    if extra > 0 {
        let in_tree: HashSet<(u32, u32)> = tree.iter().map(|e| (e.from, e.to)).collect();
        let mut shortest = BinaryHeap::with_capacity(extra + 1);
        for (i, a) in locations.iter().enumerate() {
            for b in &locations[i + 1..] {
                let edge = edge_between(a, b);
                if in_tree.contains(&(edge.from, edge.to)) {
                    continue;
                }
                if shortest.len() < extra {
                    shortest.push(edge);
                } else if shortest.peek().is_some_and(|longest| edge < *longest) {
                    shortest.pop();
                    shortest.push(edge);
                }
            }
        }
        tree.extend(shortest.into_sorted_vec());
    }
    tree
}

/// Алгоритм Прима на полном графе; рёбра в порядке присоединения вершин
fn spanning_tree(locations: &[Location]) -> Vec<RoadEdge> {
    let n = locations.len();
    let mut in_tree = vec![false; n];
    in_tree[0] = true;
    // Лучшее ребро от дерева к каждой вершине вне его
    let mut best: Vec<RoadEdge> = locations
        .iter()
        .map(|loc| edge_between(&locations[0], loc))
        .collect();

    let mut tree = Vec::with_capacity(n - 1);
    for _ in 1..n {
        let Some(next) = (0..n).filter(|&v| !in_tree[v]).min_by_key(|&v| best[v]) else {
            break;
        };
        in_tree[next] = true;
        tree.push(best[next]);
        let joined = &locations[next];
        for ((loc, &done), slot) in locations.iter().zip(&in_tree).zip(&mut best) {
            if !done {
                let edge = edge_between(joined, loc);
                if edge < *slot {
                    *slot = edge;
                }
            }
        }
    }
    tree
}
