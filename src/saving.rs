use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::view::ViewState;

lazy_static! {
    static ref UNSAFE_KEY_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Key-value store for JSON blobs. The view engine never touches storage
/// itself; callers that want durable views pass one of these in.
pub trait BlobStore {
    fn load(&self, key: &str) -> Result<Option<Json>>;
    fn save(&mut self, key: &str, value: Json) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Json>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Json>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: Json) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores each key as a gzip-compressed JSON file under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(FileStore {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name = UNSAFE_KEY_CHARS.replace_all(key, "_");
        self.dir.join(format!("{}.json.gz", name))
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Json>> {
        let file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(Some(serde_json::from_reader(reader)?))
    }

    fn save(&mut self, key: &str, value: Json) -> Result<()> {
        let file = File::create(self.path_for(key))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);

        serde_json::to_writer(&mut writer, &value)?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}

pub fn save_view_state(store: &mut dyn BlobStore, key: &str, state: &ViewState) -> Result<()> {
    store.save(key, serde_json::to_value(state)?)
}

pub fn load_view_state(store: &dyn BlobStore, key: &str) -> Result<Option<ViewState>> {
    match store.load(key)? {
        Some(json) => Ok(Some(serde_json::from_value(json)?)),
        None => Ok(None),
    }
}

/// Debounced saving of a view state.
///
/// Callers report edits with [`Autosave::touch`] and call
/// [`Autosave::poll`] whenever convenient; the state is written once no edit
/// has happened for the configured delay. Time is passed in, so nothing here
/// sleeps or spawns.
#[derive(Debug)]
pub struct Autosave {
    key: String,
    delay: Duration,
    last_edit: Option<Instant>,
}

impl Autosave {
    pub fn new(key: impl Into<String>, delay: Duration) -> Self {
        Autosave {
            key: key.into(),
            delay,
            last_edit: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    /// Saves if an edit is pending and the delay has passed. Returns whether
    /// a save happened.
    pub fn poll(&mut self, now: Instant, store: &mut dyn BlobStore, state: &ViewState) -> Result<bool> {
        match self.last_edit {
            Some(edited) if now.saturating_duration_since(edited) >= self.delay => {
                self.flush(store, state)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Saves immediately if anything is pending. A failed save stays pending.
    pub fn flush(&mut self, store: &mut dyn BlobStore, state: &ViewState) -> Result<()> {
        if self.last_edit.is_some() {
            debug!("autosaving view state under '{}'", self.key);
            save_view_state(store, &self.key, state)?;
            self.last_edit = None;
        }
        Ok(())
    }
}
