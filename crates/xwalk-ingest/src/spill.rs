//! Spill-to-disk column cache.
//!
//! [`SpillingProvider`] wraps another provider and keeps recently read
//! columns in memory up to a byte budget. Columns pushed out of the budget are
//! written to a temporary directory and reloaded on demand. Reads return the
//! same values whether or not a column was spilled.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;
use tracing::{debug, warn};
use xwalk_model::RawValue;

use crate::error::ProviderError;
use crate::provider::TabularProvider;

/// Reload attempts before a spilled column is reported unavailable.
pub const MAX_RELOAD_ATTEMPTS: usize = 3;

#[derive(Default)]
struct SpillState {
    resident: HashMap<String, Vec<RawValue>>,
    /// Least recently used first.
    lru: VecDeque<String>,
    resident_bytes: usize,
    spilled: HashMap<String, PathBuf>,
    dir: Option<TempDir>,
}

pub struct SpillingProvider<P> {
    inner: P,
    budget_bytes: usize,
    spill_parent: Option<PathBuf>,
    state: Mutex<SpillState>,
}

impl<P: TabularProvider> SpillingProvider<P> {
    pub fn new(inner: P, budget_bytes: usize) -> Self {
        Self {
            inner,
            budget_bytes,
            spill_parent: None,
            state: Mutex::new(SpillState::default()),
        }
    }

    /// Create spill directories under `parent` instead of the system temp dir.
    pub fn with_spill_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.spill_parent = Some(parent.into());
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Directory currently holding spill files, if any were written.
    pub fn spill_dir(&self) -> Option<PathBuf> {
        self.lock().dir.as_ref().map(|dir| dir.path().to_path_buf())
    }

    pub fn spilled_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().spilled.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resident_bytes(&self) -> usize {
        self.lock().resident_bytes
    }

    fn lock(&self) -> MutexGuard<'_, SpillState> {
        // No mutation below can panic halfway, so a poisoned state is intact.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn admit(
        &self,
        state: &mut SpillState,
        name: &str,
        values: &[RawValue],
    ) -> Result<(), ProviderError> {
        let size = estimate_bytes(values);
        while state.resident_bytes + size > self.budget_bytes {
            let Some(victim) = state.lru.pop_front() else {
                break;
            };
            if let Some(evicted) = state.resident.remove(&victim) {
                state.resident_bytes -= estimate_bytes(&evicted);
                self.spill(state, &victim, &evicted)?;
            }
        }
        if size > self.budget_bytes {
            // Larger than the whole budget: never resident.
            if !state.spilled.contains_key(name) {
                self.spill(state, name, values)?;
            }
            return Ok(());
        }
        state.resident.insert(name.to_string(), values.to_vec());
        state.lru.push_back(name.to_string());
        state.resident_bytes += size;
        Ok(())
    }

    fn spill(
        &self,
        state: &mut SpillState,
        name: &str,
        values: &[RawValue],
    ) -> Result<(), ProviderError> {
        if state.spilled.contains_key(name) {
            return Ok(());
        }
        let unavailable = |message: String| ProviderError::StorageUnavailable {
            column: name.to_string(),
            attempts: 1,
            message,
        };
        if state.dir.is_none() {
            let mut builder = tempfile::Builder::new();
            builder.prefix("xwalk-spill-");
            let dir = match &self.spill_parent {
                Some(parent) => builder.tempdir_in(parent),
                None => builder.tempdir(),
            }
            .map_err(|e| unavailable(e.to_string()))?;
            debug!(dir = %dir.path().display(), "created spill directory");
            state.dir = Some(dir);
        }
        let Some(dir) = state.dir.as_ref() else {
            return Err(unavailable("spill directory missing".to_string()));
        };
        let path = dir.path().join(format!("column-{}.json", state.spilled.len()));
        write_column(&path, values).map_err(unavailable)?;
        debug!(column = name, path = %path.display(), rows = values.len(), "spilled column");
        state.spilled.insert(name.to_string(), path);
        Ok(())
    }

    fn reload(&self, name: &str, path: &Path) -> Result<Vec<RawValue>, ProviderError> {
        let mut last_error = String::new();
        for attempt in 1..=MAX_RELOAD_ATTEMPTS {
            match read_column_file(path) {
                Ok(values) => return Ok(values),
                Err(message) => {
                    warn!(column = name, attempt, error = %message, "spill reload failed");
                    last_error = message;
                }
            }
        }
        Err(ProviderError::StorageUnavailable {
            column: name.to_string(),
            attempts: MAX_RELOAD_ATTEMPTS,
            message: last_error,
        })
    }
}

impl<P: TabularProvider> TabularProvider for SpillingProvider<P> {
    fn column_names(&self) -> Vec<String> {
        self.inner.column_names()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn read_column(&self, name: &str) -> Result<Vec<RawValue>, ProviderError> {
        let spilled = {
            let mut state = self.lock();
            if let Some(values) = state.resident.get(name).cloned() {
                if let Some(pos) = state.lru.iter().position(|n| n == name) {
                    state.lru.remove(pos);
                }
                state.lru.push_back(name.to_string());
                return Ok(values);
            }
            state.spilled.get(name).cloned()
        };
        // Loads run unlocked. Two readers of one column may both load it;
        // the first to finish is admitted.
        let values = match spilled {
            Some(path) => self.reload(name, &path)?,
            None => self.inner.read_column(name)?,
        };
        let mut state = self.lock();
        if !state.resident.contains_key(name) {
            self.admit(&mut state, name, &values)?;
        }
        Ok(values)
    }

    fn discard_spill(&self) {
        let mut state = self.lock();
        state.spilled.clear();
        state.resident.clear();
        state.lru.clear();
        state.resident_bytes = 0;
        if let Some(dir) = state.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(error) = dir.close() {
                warn!(dir = %path.display(), %error, "failed to remove spill directory");
            } else {
                debug!(dir = %path.display(), "discarded spill directory");
            }
        }
        self.inner.discard_spill();
    }
}

fn estimate_bytes(values: &[RawValue]) -> usize {
    values
        .iter()
        .map(|value| {
            std::mem::size_of::<RawValue>()
                + match value {
                    RawValue::Text(s) => s.len(),
                    _ => 0,
                }
        })
        .sum()
}

/// JSON has no NaN or infinity: NaN is stored as null and infinities as
/// their text form, both of which coerce exactly like the original float.
fn spill_safe(value: &RawValue) -> RawValue {
    match value {
        RawValue::Float(v) if v.is_nan() => RawValue::Null,
        RawValue::Float(v) if v.is_infinite() => RawValue::Text(v.to_string()),
        other => other.clone(),
    }
}

fn write_column(path: &Path, values: &[RawValue]) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let safe: Vec<RawValue> = values.iter().map(spill_safe).collect();
    serde_json::to_writer(BufWriter::new(file), &safe).map_err(|e| e.to_string())
}

fn read_column_file(path: &Path) -> Result<Vec<RawValue>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())
}
