//! Clip dataset
//!
//! Static mapping from grid cell to clip metadata. The JSON file is keyed by
//! `"{x}_{stored_row}"` where rows are stored bottom-up; all lookups go
//! through [`Cell::stored_row`] so the flip is applied in exactly one place.
//!
//! Malformed entries are skipped with a warning rather than failing the load.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Cell, GRID_SIZE};

/// Errors that can occur while loading the dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Dataset is not a JSON object of records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Speaker gender as recorded in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn name(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Exact (case-sensitive) name match
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of non-speech vocal sound in a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundType {
    Sigh,
    Throatclearing,
    Sniff,
    Laughter,
    Sneeze,
    Cough,
}

impl SoundType {
    pub const ALL: [SoundType; 6] = [
        SoundType::Sigh,
        SoundType::Throatclearing,
        SoundType::Sniff,
        SoundType::Laughter,
        SoundType::Sneeze,
        SoundType::Cough,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SoundType::Sigh => "Sigh",
            SoundType::Throatclearing => "Throatclearing",
            SoundType::Sniff => "Sniff",
            SoundType::Laughter => "Laughter",
            SoundType::Sneeze => "Sneeze",
            SoundType::Cough => "Cough",
        }
    }

    /// Case-insensitive name match
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Emoji shown next to the metadata readout
    pub fn emoji(&self) -> &'static str {
        match self {
            SoundType::Sigh => "🥱",
            SoundType::Throatclearing => "😤",
            SoundType::Sniff => "👃",
            SoundType::Laughter => "😂",
            SoundType::Sneeze => "🤧",
            SoundType::Cough => "😮‍💨",
        }
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata for one clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRecord {
    pub id: String,
    /// Speaker age; NaN when the source value is not numeric
    pub age: f64,
    pub gender: Gender,
    pub sound_type: SoundType,
    /// Offset into the shared audio resource (seconds)
    pub start_time: f64,
    /// End offset into the shared audio resource (seconds)
    pub end_time: f64,
}

impl ClipRecord {
    /// Clip length in seconds (never negative)
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// JSON numbers sometimes arrive as strings
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64(self) -> f64 {
        match self {
            NumberOrText::Number(n) => n,
            NumberOrText::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn into_id(self) -> String {
        match self {
            NumberOrText::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    id: NumberOrText,
    /// Missing or null ages load as NaN; only age filters reject them
    #[serde(default)]
    age: Option<NumberOrText>,
    gender: String,
    sound_type: String,
    start_time: NumberOrText,
    end_time: NumberOrText,
}

impl RawRecord {
    fn into_record(self) -> Result<ClipRecord, String> {
        let gender = Gender::from_name(&self.gender)
            .ok_or_else(|| format!("unknown gender {:?}", self.gender))?;
        let sound_type = SoundType::from_name(&self.sound_type)
            .ok_or_else(|| format!("unknown sound type {:?}", self.sound_type))?;
        let start_time = self.start_time.into_f64();
        let end_time = self.end_time.into_f64();
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err("non-numeric start/end time".to_string());
        }

        Ok(ClipRecord {
            id: self.id.into_id(),
            age: self.age.map_or(f64::NAN, NumberOrText::into_f64),
            gender,
            sound_type,
            start_time,
            end_time,
        })
    }
}

/// Parse a `"{x}_{stored_row}"` key into a cell
fn parse_key(key: &str) -> Option<Cell> {
    let (x, row) = key.split_once('_')?;
    let x: i32 = x.trim().parse().ok()?;
    let row: i32 = row.trim().parse().ok()?;
    let cell = Cell::from_stored(x, row);
    cell.in_bounds().then_some(cell)
}

/// Read-only, sparse grid of clip records
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Indexed by `stored_row * GRID_SIZE + x`
    records: Vec<Option<ClipRecord>>,
    len: usize,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// Dataset with no records (every cell filtered out)
    pub fn empty() -> Self {
        Self {
            records: vec![None; (GRID_SIZE * GRID_SIZE) as usize],
            len: 0,
        }
    }

    /// Build from screen-oriented cells; out-of-bounds cells are ignored
    pub fn from_records(records: impl IntoIterator<Item = (Cell, ClipRecord)>) -> Self {
        let mut dataset = Self::empty();
        for (cell, record) in records {
            dataset.insert(cell, record);
        }
        dataset
    }

    fn index(cell: Cell) -> Option<usize> {
        cell.in_bounds()
            .then(|| (cell.stored_row() * GRID_SIZE + cell.x) as usize)
    }

    fn insert(&mut self, cell: Cell, record: ClipRecord) {
        if let Some(idx) = Self::index(cell) {
            if self.records[idx].replace(record).is_none() {
                self.len += 1;
            }
        }
    }

    /// Load the dataset JSON from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_json_str(&contents)?;
        log::info!("Dataset loaded from {:?}: {} records", path, dataset.len());
        Ok(dataset)
    }

    /// Parse the dataset JSON, skipping malformed entries
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut dataset = Self::empty();
        let mut skipped = 0usize;

        for (key, value) in raw {
            let Some(cell) = parse_key(&key) else {
                log::warn!("Dataset: skipping record with invalid key {:?}", key);
                skipped += 1;
                continue;
            };

            let record = serde_json::from_value::<RawRecord>(value)
                .map_err(|e| e.to_string())
                .and_then(RawRecord::into_record);

            match record {
                Ok(record) => dataset.insert(cell, record),
                Err(e) => {
                    log::warn!("Dataset: skipping record {}: {}", key, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::warn!("Dataset: {} malformed records skipped", skipped);
        }
        Ok(dataset)
    }

    /// Record at a screen-oriented cell, if any
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&ClipRecord> {
        Self::index(cell).and_then(|idx| self.records[idx].as_ref())
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// All records with their screen-oriented cells
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &ClipRecord)> {
        self.records.iter().enumerate().filter_map(|(idx, record)| {
            let idx = idx as i32;
            record
                .as_ref()
                .map(|r| (Cell::from_stored(idx % GRID_SIZE, idx / GRID_SIZE), r))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
