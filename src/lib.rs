//! Favorites persistence and input debouncing for the LinkHub front end.

#[macro_use]
extern crate lazy_static;

use std::sync::Mutex;

pub mod config;
pub mod debounce;
pub mod logger;
pub mod storage;
pub mod store;

pub mod models {
    pub mod favorite;
}

pub use config::Config;
pub use debounce::{debounce, Debouncer};
pub use models::favorite::{Favorite, RecordError};
pub use storage::{FileBackend, MemoryBackend, NullBackend, StorageBackend, StorageError, STORAGE_KEY};
pub use store::{export_filename, FavoritesError, FavoritesStore, ImportError};

lazy_static! {
    pub static ref CONFIG_INSTANCE: Mutex<Config> = Mutex::new(Config::new());
}
