use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;

/// Durable slot holding one serialized cart. Read once when the store is
/// constructed, overwritten in full on every mutation.
pub trait CartStorage: Send {
  /// `Ok(None)` means the slot has never been written; that is not an error.
  fn load(&self) -> anyhow::Result<Option<String>>;
  fn save(&self, serialized: &str) -> anyhow::Result<()>;
}

/// File-backed storage: one JSON document, replaced atomically on save so a
/// crash mid-write never leaves a truncated cart behind.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
  path: PathBuf,
}

impl JsonFileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl CartStorage for JsonFileStorage {
  fn load(&self) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(&self.path) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e).with_context(|| format!("reading cart storage at {}", self.path.display())),
    }
  }

  fn save(&self, serialized: &str) -> anyhow::Result<()> {
    let tmp = self.path.with_extension("tmp");
    fs::write(&tmp, serialized).with_context(|| format!("writing cart storage at {}", tmp.display()))?;
    fs::rename(&tmp, &self.path).with_context(|| format!("replacing cart storage at {}", self.path.display()))?;
    Ok(())
  }
}

/// In-memory storage slot, shared via `Arc` so tests can hand the same slot
/// to a second store and assert on the hydrate round trip.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Raw contents of the slot, for assertions.
  pub fn contents(&self) -> Option<String> {
    self.slot.lock().clone()
  }
}

impl CartStorage for MemoryStorage {
  fn load(&self) -> anyhow::Result<Option<String>> {
    Ok(self.slot.lock().clone())
  }

  fn save(&self, serialized: &str) -> anyhow::Result<()> {
    *self.slot.lock() = Some(serialized.to_string());
    Ok(())
  }
}
