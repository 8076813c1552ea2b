// src/loader/records.rs
//! Записи городов, типов земли и регионов
//!
//! Все три файла — JSON-массивы объектов. Синтаксические ошибки сообщаются со
//! строкой, которую указал парсер; смысловые — со строкой, где начинается запись.

use crate::error::{Error, Result, read_to_string};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Название из пула имён континентов
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityName {
    pub name: String,
}

/// Тип земли
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Land {
    pub name: String,
    /// Символ этого типа на карте
    pub symbol: char,
    /// Проходимые клетки образуют континенты
    #[serde(default = "default_passable")]
    pub passable: bool,
    /// Вес клетки при выборе мест для локаций (0 = локации здесь не ставятся)
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Цвет на карте, `"#rrggbb"`
    #[serde(default)]
    pub color: Option<String>,
}

fn default_passable() -> bool {
    true
}
fn default_weight() -> u32 {
    1
}

impl Land {
    /// Цвет типа земли; без явного цвета — зелёный для суши и синий для непроходимого
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        self.color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(if self.passable {
                [110, 160, 80]
            } else {
                [30, 60, 130]
            })
    }
}

/// Прямоугольник в координатах сетки, границы включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionArea {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl RegionArea {
    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub area: RegionArea,
}

/// Разбирает `"#rrggbb"` в компоненты
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let (Ok(r), Ok(g), Ok(b)) = (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) else {
        return None;
    };
    Some([r, g, b])
}

/// Строки (с 1), на которых начинаются элементы JSON-массива верхнего уровня.
///
/// Вызывается только для текста, который уже успешно разобран.
fn element_start_lines(text: &str) -> Vec<usize> {
    let mut lines = Vec::new();
    let mut line = 1;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut expecting = false;

    for ch in text.chars() {
        if ch == '\n' {
            line += 1;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if expecting && !ch.is_whitespace() && ch != ']' {
            lines.push(line);
            expecting = false;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => {
                depth += 1;
                if depth == 1 && ch == '[' {
                    expecting = true;
                }
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 1 => expecting = true,
            _ => {}
        }
    }
    lines
}

/// Общий разбор файла записей: JSON-массив, непустые уникальные имена,
/// затем проверка каждой записи по порядку.
fn load_records<T, N, V>(path: &Path, name_of: N, mut validate: V) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    N: Fn(&T) -> &str,
    V: FnMut(&T) -> std::result::Result<(), String>,
{
    let text = read_to_string(path)?;
    let records: Vec<T> = serde_json::from_str(&text)
        .map_err(|e| Error::malformed(path, e.line().max(1), e.to_string()))?;

    let starts = element_start_lines(&text);
    let line_of = |i: usize| starts.get(i).copied().unwrap_or(1);

    let mut seen = HashSet::new();
    for (i, record) in records.iter().enumerate() {
        let name = name_of(record);
        if name.trim().is_empty() {
            return Err(Error::malformed(path, line_of(i), "record has an empty name"));
        }
        if !seen.insert(name.to_string()) {
            return Err(Error::malformed(
                path,
                line_of(i),
                format!("duplicate name {name:?}"),
            ));
        }
        validate(record).map_err(|message| Error::malformed(path, line_of(i), message))?;
    }
    Ok(records)
}

pub fn load_cities(path: &Path) -> Result<Vec<CityName>> {
    load_records(path, |c: &CityName| c.name.as_str(), |_| Ok(()))
}

pub fn load_lands(path: &Path) -> Result<Vec<Land>> {
    // Символы должны однозначно указывать на тип земли
    let mut symbols = HashSet::new();
    load_records(
        path,
        |l: &Land| l.name.as_str(),
        |l| {
            if let Some(c) = &l.color
                && parse_hex_color(c).is_none()
            {
                return Err(format!("bad color {c:?}"));
            }
            if !symbols.insert(l.symbol) {
                return Err(format!("duplicate symbol {:?}", l.symbol));
            }
            Ok(())
        },
    )
}

pub fn load_regions(path: &Path) -> Result<Vec<Region>> {
    load_records(
        path,
        |r: &Region| r.name.as_str(),
        |r| {
            if r.area.top > r.area.bottom || r.area.left > r.area.right {
                Err(format!("region {:?} has an inverted area", r.name))
            } else {
                Ok(())
            }
        },
    )
}
