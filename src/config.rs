// src/config.rs
//! Конфигурация генерации карты
//!
//! Этот модуль определяет все параметры, управляющие построением мира:
//! - Связность клеток при поиске континентов
//! - Порог отсева мелких массивов суши
//! - Плотность и разрежённость локаций
//! - Плотность дорог и количество врат
//! - Настройки рендеринга
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::error::{Result, read_to_string};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Правило соседства клеток при заливке континентов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Adjacency {
    /// Только по сторонам (север, юг, запад, восток)
    #[default]
    Four,
    /// По сторонам и диагоналям
    Eight,
}

impl Adjacency {
    /// Смещения `(dr, dc)` соседних клеток.
    #[must_use]
    pub fn offsets(self) -> &'static [(i32, i32)] {
        const FOUR: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
        const EIGHT: [(i32, i32); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Adjacency::Four => &FOUR,
            Adjacency::Eight => &EIGHT,
        }
    }
}

/// Настройки рендеринга
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSettings {
    /// Раскрашивать клетки по цвету типа земли (иначе — оттенки серого)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Масштабировать изображение до `target_width` (иначе — один пиксель на клетку)
    #[serde(default = "default_true")]
    pub scale: bool,

    /// Целевая ширина изображения в пикселях
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Амплитуда шумовой вариации цвета (0.0 = без вариации)
    #[serde(default = "default_color_jitter")]
    pub color_jitter: f32,

    /// Радиус точки локации в пикселях (после масштабирования)
    #[serde(default = "default_location_radius")]
    pub location_radius: u32,
}

fn default_true() -> bool {
    true
}
fn default_target_width() -> u32 {
    1024
}
fn default_color_jitter() -> f32 {
    0.06
}
fn default_location_radius() -> u32 {
    3
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color: true,
            scale: true,
            target_width: 1024,
            color_jitter: 0.06,
            location_radius: 3,
        }
    }
}

/// Основные параметры построения мира
///
/// Полная конфигурация для одного запуска генерации. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Сид генератора случайных чисел (если сид не восстановлен из файла)
    #[serde(default)]
    pub seed: u64,

    /// Правило соседства при поиске континентов
    #[serde(default)]
    pub adjacency: Adjacency,

    /// Минимальный размер континента в клетках; меньшие массивы считаются шумом
    #[serde(default = "default_min_continent_cells")]
    pub min_continent_cells: usize,

    /// Сколько клеток континента приходится на одну локацию
    #[serde(default = "default_cells_per_location")]
    pub cells_per_location: usize,

    /// Минимальное евклидово расстояние между локациями одного континента
    #[serde(default = "default_min_location_spacing")]
    pub min_location_spacing: f64,

    /// Бюджет попыток размещения на каждую требуемую локацию
    #[serde(default = "default_placement_attempts")]
    pub placement_attempts_per_location: usize,

    /// Доля избыточных дорог сверх остовного дерева:
    /// - `0.0` — только дерево,
    /// - `1.0` — ещё столько же дорог, сколько в дереве.
    #[serde(default = "default_road_density")]
    pub road_density: f32,

    /// Количество врат
    #[serde(default = "default_gate_count")]
    pub gate_count: usize,

    /// Бюджет попыток на каждые врата
    #[serde(default = "default_gate_attempts")]
    pub gate_attempts_per_gate: usize,

    /// Префикс синтетического имени, когда пул названий городов исчерпан
    #[serde(default = "default_synthetic_name_prefix")]
    pub synthetic_name_prefix: String,

    /// Настройки рендеринга
    #[serde(default)]
    pub render: RenderSettings,
}

fn default_min_continent_cells() -> usize {
    12
}
fn default_cells_per_location() -> usize {
    40
}
fn default_min_location_spacing() -> f64 {
    3.0
}
fn default_placement_attempts() -> usize {
    30
}
fn default_road_density() -> f32 {
    0.25
}
fn default_gate_count() -> usize {
    8
}
fn default_gate_attempts() -> usize {
    50
}
fn default_synthetic_name_prefix() -> String {
    "Continent ".to_string()
}

impl BuildConfig {
    /// Загружает параметры из TOML-файла
    ///
    /// # Ошибки
    /// `MissingFile`, если файла нет; `Config`, если формат недопустим.
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// seed = 42
    /// adjacency = "Eight"
    /// gate_count = 12
    ///
    /// [render]
    /// target_width = 2048
    /// ```
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            adjacency: Adjacency::Four,
            min_continent_cells: 12,
            cells_per_location: 40,
            min_location_spacing: 3.0,
            placement_attempts_per_location: 30,
            road_density: 0.25,
            gate_count: 8,
            gate_attempts_per_gate: 50,
            synthetic_name_prefix: "Continent ".to_string(),
            render: RenderSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let params: BuildConfig = toml::from_str("").unwrap();
        assert_eq!(params, BuildConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let params: BuildConfig = toml::from_str(
            "seed = 42\nadjacency = \"Eight\"\n[render]\ncolor = false\n",
        )
        .unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.adjacency, Adjacency::Eight);
        assert!(!params.render.color);
        assert!(params.render.scale);
        assert_eq!(params.gate_count, 8);
    }

    #[test]
    fn eight_adjacency_includes_diagonals() {
        assert_eq!(Adjacency::Four.offsets().len(), 4);
        assert!(Adjacency::Eight.offsets().contains(&(1, 1)));
    }
}
