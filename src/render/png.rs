// src/render/png.rs
//! Растровая карта
//!
//! Рельеф рисуется по пикселю на клетку и растягивается до нужной ширины
//! фильтром `Nearest`, чтобы границы клеток оставались чёткими. Дороги, врата
//! и локации рисуются поверх уже в итоговом масштабе.

use crate::error::Result;
use crate::render::{
    GATE_COLOR, LOCATION_COLOR, Palette, Projection, ROAD_COLOR, RenderOptions, check_deadline,
};
use crate::world::World;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use std::path::Path;

fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Рисует карту в память
pub fn draw_png(world: &World, options: &RenderOptions) -> Result<RgbaImage> {
    let palette = Palette::new(world, options);
    let projection = Projection::new(world, options);

    let mut base: RgbaImage = ImageBuffer::new(world.cols(), world.rows());
    for row in 0..world.rows() {
        check_deadline(options, "terrain")?;
        for col in 0..world.cols() {
            base.put_pixel(col, row, rgba(palette.cell(world, row, col)));
        }
    }

    let mut img = if (projection.width, projection.height) == base.dimensions() {
        base
    } else {
        imageops::resize(
            &base,
            projection.width,
            projection.height,
            FilterType::Nearest,
        )
    };

    check_deadline(options, "overlay")?;
    let locations = world.locations();
    let center = |id: u32| {
        let loc = &locations[id as usize];
        projection.center(loc.row, loc.col)
    };

    for road in world.roads() {
        draw_line_segment_mut(&mut img, center(road.from), center(road.to), rgba(ROAD_COLOR));
    }
    for gate in world.gates() {
        draw_line_segment_mut(&mut img, center(gate.from), center(gate.to), rgba(GATE_COLOR));
    }

    // Без масштаба локация занимает ровно свою клетку
    let radius = if options.scale {
        options.location_radius
    } else {
        0
    };
    for loc in locations {
        let (x, y) = projection.center(loc.row, loc.col);
        if radius == 0 {
            let (px, py) = (x as u32, y as u32);
            if px < img.width() && py < img.height() {
                img.put_pixel(px, py, rgba(LOCATION_COLOR));
            }
        } else {
            draw_filled_circle_mut(
                &mut img,
                (x as i32, y as i32),
                radius as i32,
                rgba(LOCATION_COLOR),
            );
        }
    }

    Ok(img)
}

/// Рисует карту и сохраняет её; формат определяется расширением файла
pub fn render_png(world: &World, options: &RenderOptions, path: &Path) -> Result<()> {
    let img = draw_png(world, options)?;
    check_deadline(options, "encode")?;
    img.save(path)?;
    tracing::info!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "карта сохранена"
    );
    Ok(())
}
