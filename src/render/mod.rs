// src/render/mod.rs
//! Визуализация готового мира
//!
//! Рендер только читает [`World`] и не трогает записанные артефакты: ошибка
//! здесь сообщается вызывающему, но данные мира остаются в силе.
//!
//! ## Слои
//!
//! 1. **Рельеф** — клетка окрашивается цветом типа земли (`Land::color`) или,
//!    без цвета, в серый по проходимости. Цвет слегка варьируется когерентным
//!    шумом, сид которого берётся из записи сида мира, поэтому картинка
//!    воспроизводима.
//! 2. **Дороги** — отрезки между центрами клеток локаций.
//! 3. **Врата** — отрезки другого цвета (в SVG — пунктир).
//! 4. **Локации** — точки.
//! 5. **Подписи континентов** — только в SVG.
//!
//! ## Масштаб
//!
//! С масштабированием ширина изображения равна `target_width`, высота
//! пропорциональна; без него — одна клетка на пиксель.

pub mod png;
pub mod svg;

pub use png::render_png;
pub use svg::render_svg;

use crate::config::RenderSettings;
use crate::error::{Error, Result};
use crate::world::World;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use std::time::{Duration, Instant};

pub(crate) const ROAD_COLOR: [u8; 3] = [92, 62, 30];
pub(crate) const GATE_COLOR: [u8; 3] = [200, 40, 200];
pub(crate) const LOCATION_COLOR: [u8; 3] = [20, 20, 20];

/// Параметры одного рендера
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub color: bool,
    pub scale: bool,
    pub target_width: u32,
    pub color_jitter: f32,
    pub location_radius: u32,
    /// Крайний срок; после него рендер прерывается с `RenderTimeout`
    pub deadline: Option<Instant>,
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            color: settings.color,
            scale: settings.scale,
            target_width: settings.target_width,
            color_jitter: settings.color_jitter,
            location_radius: settings.location_radius,
            deadline: None,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderSettings::default())
    }
}

impl RenderOptions {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }
}

pub(crate) fn check_deadline(options: &RenderOptions, stage: &'static str) -> Result<()> {
    match options.deadline {
        Some(deadline) if Instant::now() >= deadline => {
            tracing::warn!(stage, "рендер прерван по времени");
            Err(Error::RenderTimeout { stage })
        }
        _ => Ok(()),
    }
}

/// Переход от координат сетки к пикселям
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projection {
    pub width: u32,
    pub height: u32,
    /// Пикселей на клетку
    pub scale: f32,
}

impl Projection {
    pub fn new(world: &World, options: &RenderOptions) -> Self {
        let scale = if options.scale && world.cols() > 0 {
            options.target_width.max(1) as f32 / world.cols() as f32
        } else {
            1.0
        };
        Self {
            width: ((world.cols() as f32 * scale).round() as u32).max(1),
            height: ((world.rows() as f32 * scale).round() as u32).max(1),
            scale,
        }
    }

    /// Центр клетки в пикселях
    pub fn center(&self, row: u32, col: u32) -> (f32, f32) {
        (
            (col as f32 + 0.5) * self.scale,
            (row as f32 + 0.5) * self.scale,
        )
    }
}

/// Цвета клеток рельефа
pub(crate) struct Palette {
    color: bool,
    jitter: Option<(FastNoiseLite, f32)>,
}

impl Palette {
    pub fn new(world: &World, options: &RenderOptions) -> Self {
        let jitter = (options.color && options.color_jitter > 0.0).then(|| {
            let mut rng = world.seed().derive("render", 0);
            let mut noise = FastNoiseLite::new();
            noise.set_seed(Some(rng.next() as i32));
            noise.set_noise_type(Some(NoiseType::OpenSimplex2));
            noise.set_frequency(Some(0.08));
            (noise, options.color_jitter)
        });
        Self {
            color: options.color,
            jitter,
        }
    }

    pub fn cell(&self, world: &World, row: u32, col: u32) -> [u8; 3] {
        let land = world.land_at(row, col);
        let base = if self.color {
            land.rgb()
        } else if land.passable {
            [200, 200, 200]
        } else {
            [60, 60, 60]
        };

        match &self.jitter {
            Some((noise, amount)) => {
                let k = 1.0 + noise.get_noise_2d(col as f32, row as f32) * amount;
                base.map(|c| (f32::from(c) * k).clamp(0.0, 255.0) as u8)
            }
            None => base,
        }
    }
}

pub(crate) fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
