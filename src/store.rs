use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::models::favorite::{Favorite, RecordError};
use crate::storage::{StorageBackend, StorageError, STORAGE_KEY};

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored favorites are corrupted: {0}")]
    Corrupted(#[source] serde_json::Error),
    #[error("invalid favorite: {0}")]
    InvalidRecord(#[from] RecordError),
    #[error("failed to encode favorites: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write export file {path:?}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import data: {0}")]
    Read(#[from] std::io::Error),
    #[error("import data is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("import data must be a JSON array")]
    InvalidFormat,
    #[error("record {index} of import data is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: RecordError,
    },
    #[error("failed to encode favorites: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// `linkhub-favorites-YYYY-MM-DD.json`
pub fn export_filename(date: NaiveDate) -> String {
    format!("{}-{}.json", STORAGE_KEY, date.format("%Y-%m-%d"))
}

/// Favorites collection persisted as one JSON array in a [`StorageBackend`].
///
/// Every mutation reads the whole collection, changes it in memory and writes
/// it back. Concurrent writers through separate stores are last-write-wins.
pub struct FavoritesStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> FavoritesStore<B> {
    pub fn new(backend: B) -> Self {
        FavoritesStore { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get_favorites(&self) -> Result<Vec<Favorite>, FavoritesError> {
        if !self.backend.is_available() {
            return Ok(Vec::new());
        }
        // an empty slot reads the same as a missing one
        let stored = match self.backend.read()? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => bytes,
            _ => return Ok(Vec::new()),
        };
        serde_json::from_slice(&stored).map_err(|e| {
            warn!("Stored favorites could not be decoded: {}", e);
            FavoritesError::Corrupted(e)
        })
    }

    /// Appends `record` unless its url is already present. Returns the
    /// collection as it stands afterwards.
    pub fn add_favorite(&self, record: Favorite) -> Result<Vec<Favorite>, FavoritesError> {
        if record.url.trim().is_empty() {
            return Err(RecordError::EmptyUrl.into());
        }
        let mut favorites = self.get_favorites()?;
        if favorites.iter().any(|f| f.url == record.url) {
            debug!("{} is already a favorite", record.url);
            return Ok(favorites);
        }
        info!("Adding favorite {}", record.url);
        favorites.push(record);
        self.persist(&favorites)?;
        Ok(favorites)
    }

    pub fn add_favorite_value(&self, value: Value) -> Result<Vec<Favorite>, FavoritesError> {
        let record = Favorite::from_value(value)?;
        self.add_favorite(record)
    }

    pub fn remove_favorite(&self, url: &str) -> Result<Vec<Favorite>, FavoritesError> {
        let favorites = self.get_favorites()?;
        let before = favorites.len();
        let filtered: Vec<Favorite> = favorites.into_iter().filter(|f| f.url != url).collect();
        info!("Removed {} favorite(s) for {}", before - filtered.len(), url);
        self.persist(&filtered)?;
        Ok(filtered)
    }

    pub fn is_favorite(&self, url: &str) -> Result<bool, FavoritesError> {
        Ok(self.get_favorites()?.iter().any(|f| f.url == url))
    }

    /// The collection as 2-space indented JSON.
    pub fn export_json(&self) -> Result<String, FavoritesError> {
        let favorites = self.get_favorites()?;
        serde_json::to_string_pretty(&favorites).map_err(FavoritesError::Encode)
    }

    /// Writes today's (UTC) export file into `dir` and returns its path.
    pub fn export_favorites(&self, dir: &Path) -> Result<PathBuf, FavoritesError> {
        self.export_favorites_on(dir, Utc::now().date_naive())
    }

    pub fn export_favorites_on(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf, FavoritesError> {
        let data = self.export_json()?;
        let path = dir.join(export_filename(date));
        let export_error = |source| FavoritesError::Export {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&path).map_err(export_error)?;
        file.write_all(data.as_bytes()).map_err(export_error)?;
        info!("Exported favorites to {:?}", path);
        Ok(path)
    }

    /// Replaces the whole collection with the JSON array read from `reader`.
    ///
    /// Nothing is written unless the input is a valid array of valid records.
    /// Repeated urls keep their first occurrence.
    pub async fn import_favorites<R>(&self, mut reader: R) -> Result<Vec<Favorite>, ImportError>
    where
        R: AsyncRead + Unpin,
    {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).await?;
        let text = String::from_utf8(raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let data: Value = serde_json::from_str(&text).map_err(ImportError::Parse)?;
        let items = match data {
            Value::Array(items) => items,
            _ => {
                warn!("Rejected import: top-level value is not an array");
                return Err(ImportError::InvalidFormat);
            }
        };

        let total = items.len();
        let mut seen = HashSet::new();
        let mut favorites = Vec::with_capacity(total);
        for (index, item) in items.into_iter().enumerate() {
            let record = Favorite::from_value(item)
                .map_err(|source| ImportError::InvalidRecord { index, source })?;
            if seen.insert(record.url.clone()) {
                favorites.push(record);
            }
        }
        let dropped = total - favorites.len();
        if dropped > 0 {
            warn!("Dropped {} duplicate url(s) from import", dropped);
        }

        let bytes = serde_json::to_vec(&favorites).map_err(ImportError::Encode)?;
        self.backend.write(&bytes)?;
        info!("Imported {} favorites", favorites.len());
        Ok(favorites)
    }

    pub async fn import_favorites_from_path(&self, path: &Path) -> Result<Vec<Favorite>, ImportError> {
        let file = tokio::fs::File::open(path).await?;
        self.import_favorites(file).await
    }

    fn persist(&self, favorites: &[Favorite]) -> Result<(), FavoritesError> {
        let bytes = serde_json::to_vec(favorites).map_err(FavoritesError::Encode)?;
        self.backend.write(&bytes)?;
        Ok(())
    }
}
