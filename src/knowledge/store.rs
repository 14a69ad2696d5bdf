use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{Map, Value};

use super::error::StoreError;
use super::merge::PinnedPositions;
use super::model::Pin;

/// File name of the pinned position map inside the data directory.
pub const POSITIONS_FILE_NAME: &str = "node-positions.json";

/// Persistence for user-pinned node coordinates.
pub trait PositionStore {
    /// Upserts one record.
    fn save(&mut self, node_id: &str, x: f32, y: f32) -> Result<(), StoreError>;

    /// Everything persisted so far. Unreadable records are skipped.
    fn load_all(&self) -> Result<PinnedPositions, StoreError>;
}

/// Positions kept as one JSON object `{ "<id>": { "x": .., "y": .. } }`.
#[derive(Clone, Debug)]
pub struct JsonPositionStore {
    path: PathBuf,
}

impl JsonPositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("notegraph")
            .join(POSITIONS_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn atomic_write(&self, data: &[u8]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path).map_err(|source| self.io_error(source))?;
            file.write_all(data).map_err(|source| self.io_error(source))?;
            file.flush().map_err(|source| self.io_error(source))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))
    }
}

impl PositionStore for JsonPositionStore {
    fn save(&mut self, node_id: &str, x: f32, y: f32) -> Result<(), StoreError> {
        let mut records = match self.read_raw()? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(records)) => records,
                _ => {
                    warn!(
                        "pinned position file {} is not a JSON object, starting over",
                        self.path.display()
                    );
                    Map::new()
                }
            },
            None => Map::new(),
        };

        records.insert(node_id.to_owned(), serde_json::to_value(Pin::new(x, y))?);
        let encoded = serde_json::to_vec_pretty(&Value::Object(records))?;
        self.atomic_write(&encoded)?;
        debug!("pinned {node_id} at ({x:.1}, {y:.1})");
        Ok(())
    }

    fn load_all(&self) -> Result<PinnedPositions, StoreError> {
        Ok(self
            .read_raw()?
            .map(|raw| decode_positions(&raw))
            .unwrap_or_default())
    }
}

/// Decodes a persisted position map, keeping every well-formed record.
pub fn decode_positions(raw: &str) -> PinnedPositions {
    let records = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(records)) => records,
        Ok(_) => {
            warn!("ignoring pinned positions: top level is not a JSON object");
            return PinnedPositions::new();
        }
        Err(error) => {
            warn!("ignoring unreadable pinned positions: {error}");
            return PinnedPositions::new();
        }
    };

    records
        .into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<Pin>(value) {
            Ok(pin) if pin.is_finite() => Some((id, pin)),
            Ok(_) => {
                warn!("ignoring non-finite pinned position for {id}");
                None
            }
            Err(error) => {
                warn!("ignoring malformed pinned position for {id}: {error}");
                None
            }
        })
        .collect()
}

/// Store that lives only as long as the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryPositionStore {
    records: PinnedPositions,
}

impl PositionStore for MemoryPositionStore {
    fn save(&mut self, node_id: &str, x: f32, y: f32) -> Result<(), StoreError> {
        self.records.insert(node_id.to_owned(), Pin::new(x, y));
        Ok(())
    }

    fn load_all(&self) -> Result<PinnedPositions, StoreError> {
        Ok(self.records.clone())
    }
}
