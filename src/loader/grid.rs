// src/loader/grid.rs
use crate::error::{Error, Result, read_to_string};
use std::path::Path;

/// Клетка сырой карты
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub symbol: char,
}

/// Прямоугольная сетка символов рельефа, индекс клетки = `row * cols + col`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
    pub symbols: Vec<char>,
}

impl Grid {
    /// Разбирает текст карты: одна строка файла — одна строка сетки.
    ///
    /// Хвостовые пустые строки игнорируются, `\r` в конце строки отбрасывается.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let Some(first) = lines.first() else {
            return Err(Error::malformed(path, 1, "map is empty"));
        };

        let cols = first.chars().count();
        if cols == 0 {
            return Err(Error::malformed(path, 1, "map row is empty"));
        }

        let mut symbols = Vec::with_capacity(cols * lines.len());
        for (i, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(Error::malformed(
                    path,
                    i + 1,
                    format!("row has {width} columns, expected {cols}"),
                ));
            }
            symbols.extend(line.chars());
        }

        Ok(Self {
            rows: lines.len() as u32,
            cols: cols as u32,
            symbols,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn index(&self, row: u32, col: u32) -> usize {
        (row * self.cols + col) as usize
    }

    #[must_use]
    pub fn coords(&self, idx: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((idx / cols) as u32, (idx % cols) as u32)
    }

    #[must_use]
    pub fn symbol(&self, row: u32, col: u32) -> char {
        self.symbols[self.index(row, col)]
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.symbols.iter().enumerate().map(|(i, &symbol)| {
            let (row, col) = self.coords(i);
            GridCell { row, col, symbol }
        })
    }

    /// Соседи клетки в пределах сетки (без зацикливания по краям)
    pub fn neighbors(
        &self,
        idx: usize,
        offsets: &'static [(i32, i32)],
    ) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = self.coords(idx);
        offsets.iter().filter_map(move |&(dr, dc)| {
            let nr = row as i32 + dr;
            let nc = col as i32 + dc;
            if nr >= 0 && nr < self.rows as i32 && nc >= 0 && nc < self.cols as i32 {
                Some(self.index(nr as u32, nc as u32))
            } else {
                None
            }
        })
    }
}

/// Загружает карту рельефа из текстового файла
pub fn load_map(path: &Path) -> Result<Grid> {
    let text = read_to_string(path)?;
    Grid::parse(path, &text)
}
