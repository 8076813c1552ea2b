// src/render/svg.rs
//! Векторная карта
//!
//! Документ собирается в `String` и пишется одним вызовом. Соседние
//! клетки строки одного цвета сливаются в один `<rect>`.

use crate::error::{Error, Result};
use crate::render::{
    GATE_COLOR, LOCATION_COLOR, Palette, Projection, ROAD_COLOR, RenderOptions, check_deadline,
    hex,
};
use crate::world::World;
use std::fmt::{self, Write};
use std::path::Path;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_header(out: &mut String, p: &Projection) -> fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = p.width,
        h = p.height
    )
}

fn write_terrain_row(
    out: &mut String,
    world: &World,
    palette: &Palette,
    p: &Projection,
    row: u32,
) -> fmt::Result {
    let mut col = 0;
    while col < world.cols() {
        let color = palette.cell(world, row, col);
        let start = col;
        while col < world.cols() && palette.cell(world, row, col) == color {
            col += 1;
        }
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            start as f32 * p.scale,
            row as f32 * p.scale,
            (col - start) as f32 * p.scale,
            p.scale,
            hex(color)
        )?;
    }
    Ok(())
}

fn write_overlay(
    out: &mut String,
    world: &World,
    options: &RenderOptions,
    p: &Projection,
) -> fmt::Result {
    let locations = world.locations();
    let center = |id: u32| {
        let loc = &locations[id as usize];
        p.center(loc.row, loc.col)
    };
    let stroke = (p.scale / 4.0).max(1.0);

    writeln!(
        out,
        r#"<g id="roads" stroke="{}" stroke-width="{stroke:.2}">"#,
        hex(ROAD_COLOR)
    )?;
    for road in world.roads() {
        let ((x1, y1), (x2, y2)) = (center(road.from), center(road.to));
        writeln!(
            out,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"/>"#
        )?;
    }
    writeln!(out, "</g>")?;

    writeln!(
        out,
        r#"<g id="gates" stroke="{}" stroke-width="{stroke:.2}" stroke-dasharray="{:.2} {:.2}" fill="none">"#,
        hex(GATE_COLOR),
        stroke * 4.0,
        stroke * 3.0
    )?;
    for gate in world.gates() {
        let ((x1, y1), (x2, y2)) = (center(gate.from), center(gate.to));
        writeln!(
            out,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}"/>"#
        )?;
    }
    writeln!(out, "</g>")?;

    let radius = if options.scale {
        options.location_radius.max(1) as f32
    } else {
        0.5
    };
    writeln!(out, r#"<g id="locations" fill="{}">"#, hex(LOCATION_COLOR))?;
    for loc in locations {
        let (cx, cy) = p.center(loc.row, loc.col);
        writeln!(
            out,
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{radius:.2}"><title>{} ({})</title></circle>"#,
            loc.id,
            escape(&loc.region)
        )?;
    }
    writeln!(out, "</g>")?;

    let font = (p.scale * 2.0).max(8.0);
    writeln!(
        out,
        r#"<g id="labels" font-family="sans-serif" font-size="{font:.1}" text-anchor="middle" fill="black" stroke="white" stroke-width="{:.2}" paint-order="stroke">"#,
        font / 6.0
    )?;
    for continent in world.continents() {
        let b = &continent.bounds;
        let (x, _) = p.center(b.top, (b.left + b.right) / 2);
        let (_, y) = p.center((b.top + b.bottom) / 2, b.left);
        writeln!(
            out,
            r#"<text x="{x:.2}" y="{y:.2}">{}</text>"#,
            escape(&continent.name)
        )?;
    }
    writeln!(out, "</g>")
}

/// Собирает SVG-документ
pub fn draw_svg(world: &World, options: &RenderOptions) -> Result<String> {
    let palette = Palette::new(world, options);
    let projection = Projection::new(world, options);

    let mut out = String::new();
    write_header(&mut out, &projection)?;
    writeln!(out, r#"<g id="terrain" shape-rendering="crispEdges">"#)?;
    for row in 0..world.rows() {
        check_deadline(options, "terrain")?;
        write_terrain_row(&mut out, world, &palette, &projection, row)?;
    }
    writeln!(out, "</g>")?;

    check_deadline(options, "overlay")?;
    write_overlay(&mut out, world, options, &projection)?;
    writeln!(out, "</svg>")?;

    Ok(out)
}

/// Собирает SVG и записывает его в `path`
pub fn render_svg(world: &World, options: &RenderOptions, path: &Path) -> Result<()> {
    let svg = draw_svg(world, options)?;
    check_deadline(options, "encode")?;
    std::fs::write(path, svg).map_err(|e| Error::io(path, e))?;
    tracing::info!(path = %path.display(), "векторная карта сохранена");
    Ok(())
}
