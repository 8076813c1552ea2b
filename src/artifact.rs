// src/artifact.rs
//! Запись и чтение артефактов мира
//!
//! Пять JSON-файлов: континенты, локации, врата, дороги и запись сида.
//! Сначала все пять сериализуются в память и пишутся во временные файлы рядом
//! с целевыми; переименование в целевые имена происходит, только когда все
//! временные файлы записаны и сброшены на диск. Ошибка до этого момента не
//! оставляет ни одного файла текущего запуска. Прежние файлы на время
//! публикации отодвигаются в сторону и возвращаются, если переименование
//! сорвалось, так что на диске всегда лежит набор одного запуска.

use crate::error::{Error, Result, read_to_string};
use crate::random::SeedRecord;
use crate::world::{Continent, Gate, Location, Road, World};
use petgraph::unionfind::UnionFind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// Пути выходных файлов
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub continents: PathBuf,
    pub locations: PathBuf,
    pub gates: PathBuf,
    pub roads: PathBuf,
    pub seed: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            continents: PathBuf::from("continents.json"),
            locations: PathBuf::from("locations.json"),
            gates: PathBuf::from("gates.json"),
            roads: PathBuf::from("roads.json"),
            seed: PathBuf::from("randseed.json"),
        }
    }
}

impl ArtifactPaths {
    /// Имена по умолчанию внутри каталога `dir`
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            continents: dir.join(defaults.continents),
            locations: dir.join(defaults.locations),
            gates: dir.join(defaults.gates),
            roads: dir.join(defaults.roads),
            seed: dir.join(defaults.seed),
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Vec<u8>> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Временный файл в каталоге назначения, чтобы переименование было атомарным
fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(|e| Error::io(path, e))?;
    tmp.write_all(bytes).map_err(|e| Error::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(path, e))?;
    Ok(tmp)
}

/// Цель должна быть обычным файлом или отсутствовать
fn check_target(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => Err(Error::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "target is not a regular file"),
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Отодвигает существующий файл во временное имя рядом с ним.
/// Копия удаляется при сбросе `TempPath`, если её не вернули на место.
fn move_aside(path: &Path) -> Result<Option<TempPath>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = NamedTempFile::new_in(parent_dir(path))
        .map_err(|e| Error::io(path, e))?
        .into_temp_path();
    fs::rename(path, &backup).map_err(|e| Error::io(path, e))?;
    Ok(Some(backup))
}

/// Убирает опубликованные файлы и возвращает прежние
fn roll_back(published: &[&PathBuf], backups: Vec<(&PathBuf, Option<TempPath>)>) {
    for path in published {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "не удалось убрать артефакт");
        }
    }
    for (path, backup) in backups {
        if let Some(backup) = backup
            && let Err(e) = fs::rename(&backup, path)
        {
            tracing::warn!(path = %path.display(), error = %e, "не удалось вернуть прежний артефакт");
        }
    }
}

/// Записывает все артефакты мира
///
/// `pretty` — форматированный JSON (иначе компактный). При одинаковых входных
/// данных и записи сида файлы совпадают побайтно.
///
/// Набор публикуется целиком или не публикуется вовсе: прежние файлы
/// отодвигаются в сторону и возвращаются, если хоть одно переименование не
/// удалось.
pub fn write_artifacts(world: &World, paths: &ArtifactPaths, pretty: bool) -> Result<()> {
    let payloads = [
        (&paths.continents, encode(world.continents(), pretty)?),
        (&paths.locations, encode(world.locations(), pretty)?),
        (&paths.gates, encode(world.gates(), pretty)?),
        (&paths.roads, encode(world.roads(), pretty)?),
        (&paths.seed, encode(world.seed(), pretty)?),
    ];
    for (path, _) in &payloads {
        check_target(path)?;
    }

    let mut staged = Vec::with_capacity(payloads.len());
    for (path, bytes) in &payloads {
        staged.push((*path, stage(path, bytes)?));
    }

    let mut backups = Vec::with_capacity(staged.len());
    for (path, _) in &staged {
        match move_aside(path) {
            Ok(backup) => backups.push((*path, backup)),
            Err(e) => {
                roll_back(&[], backups);
                return Err(e);
            }
        }
    }

    let mut published = Vec::with_capacity(staged.len());
    for (path, tmp) in staged {
        if let Err(e) = tmp.persist(path) {
            roll_back(&published, backups);
            return Err(Error::io(path, e.error));
        }
        published.push(path);
        tracing::debug!(path = %path.display(), "артефакт записан");
    }
    // Прежние версии больше не нужны; `TempPath` удаляет их при сбросе
    drop(backups);

    tracing::info!(
        continents = world.continents().len(),
        locations = world.locations().len(),
        roads = world.roads().len(),
        gates = world.gates().len(),
        "артефакты записаны"
    );
    Ok(())
}

/// Мир в том виде, в каком его видят потребители файлов
#[derive(Debug, Clone, PartialEq)]
pub struct WorldData {
    pub continents: Vec<Continent>,
    pub locations: Vec<Location>,
    pub gates: Vec<Gate>,
    pub roads: Vec<Road>,
    pub seed: SeedRecord,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| Error::malformed(path, e.line().max(1), e.to_string()))
}

/// Читает артефакты обратно
pub fn read_artifacts(paths: &ArtifactPaths) -> Result<WorldData> {
    Ok(WorldData {
        continents: read_json(&paths.continents)?,
        locations: read_json(&paths.locations)?,
        gates: read_json(&paths.gates)?,
        roads: read_json(&paths.roads)?,
        seed: SeedRecord::read_from(&paths.seed)?,
    })
}

impl WorldData {
    /// Проверяет инварианты графа; пустой список — всё в порядке
    #[must_use]
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let n = self.locations.len();

        for (i, loc) in self.locations.iter().enumerate() {
            if loc.id as usize != i {
                issues.push(format!("location #{i} has id {}", loc.id));
            }
            match self.continents.get(loc.continent as usize) {
                Some(c) if c.location_ids.contains(&loc.id) => {}
                _ => issues.push(format!(
                    "location {} is not listed by continent {}",
                    loc.id, loc.continent
                )),
            }
        }

        let mut components = UnionFind::<usize>::new(n);
        let mut road_pairs = HashSet::new();
        for road in &self.roads {
            if road.from >= road.to || road.to as usize >= n {
                issues.push(format!("road {} has bad ends {}-{}", road.id, road.from, road.to));
                continue;
            }
            let (a, b) = (&self.locations[road.from as usize], &self.locations[road.to as usize]);
            if a.continent != road.continent || b.continent != road.continent {
                issues.push(format!("road {} leaves continent {}", road.id, road.continent));
            }
            components.union(road.from as usize, road.to as usize);
            road_pairs.insert((road.from, road.to));
        }

        for continent in &self.continents {
            if let Some((&first, rest)) = continent.location_ids.split_first() {
                for &other in rest {
                    if (other as usize) < n
                        && (first as usize) < n
                        && !components.equiv(first as usize, other as usize)
                    {
                        issues.push(format!(
                            "continent {}: no road path between {first} and {other}",
                            continent.id
                        ));
                    }
                }
            }
        }

        let mut gated = HashSet::new();
        for gate in &self.gates {
            let pair = (gate.from, gate.to);
            if gate.from >= gate.to || gate.to as usize >= n {
                issues.push(format!("gate {} has bad ends {}-{}", gate.id, gate.from, gate.to));
            } else if road_pairs.contains(&pair) {
                issues.push(format!("gate {} duplicates a road", gate.id));
            } else if !gated.insert(pair) {
                issues.push(format!("gate {} repeats a gated pair", gate.id));
            }
        }

        issues
    }
}
