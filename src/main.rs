use std::env::args;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};
use linkhub_favorites::config::Settings;
use linkhub_favorites::{logger, Favorite, FavoritesStore, FileBackend, CONFIG_INSTANCE};

const USAGE: &str = "\
Usage: linkhub-favorites <command> [args]

Commands:
  list                 print all favorites
  add <url> [title]    add a favorite unless the url is already saved
  remove <url>         remove every favorite with this url
  check <url>          print whether the url is a favorite
  export [dir]         write linkhub-favorites-<date>.json
  import <file>        replace all favorites with the file's JSON array";

#[tokio::main]
async fn main() -> ExitCode {
    let settings: Settings = match CONFIG_INSTANCE.lock() {
        Ok(config) => config.settings.clone(),
        Err(poisoned) => poisoned.into_inner().settings.clone(),
    };
    if let Err(e) = logger::setup_logger(&settings) {
        eprintln!("Warning: file logging disabled: {}", e);
    }
    info!("Starting linkhub-favorites at {}", chrono::Utc::now());

    let params: Vec<String> = args().collect();
    if params.len() < 2 {
        println!("{}", USAGE);
        error!("Error: missing command");
        return ExitCode::FAILURE;
    }

    let backend = FileBackend::new(&settings.storage_dir, &settings.storage_key);
    info!("Using favorites file {:?}", backend.path());
    let store = FavoritesStore::new(backend);

    match run(&store, &settings, &params[1], &params[2..]).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    store: &FavoritesStore<FileBackend>,
    settings: &Settings,
    command: &str,
    rest: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    match (command, rest) {
        ("list", []) => {
            println!("{}", store.export_json()?);
        }
        ("add", [url]) | ("add", [url, _]) => {
            let mut record = Favorite::new(url.as_str());
            if let [_, title] = rest {
                record = record.with_field("title", title.as_str());
            }
            let favorites = store.add_favorite(record)?;
            println!("{} favorite(s) saved", favorites.len());
        }
        ("remove", [url]) => {
            let favorites = store.remove_favorite(url)?;
            println!("{} favorite(s) saved", favorites.len());
        }
        ("check", [url]) => {
            println!("{}", store.is_favorite(url)?);
        }
        ("export", []) | ("export", [_]) => {
            let dir = match rest.first() {
                Some(dir) => PathBuf::from(dir),
                None => settings.export_dir.clone(),
            };
            let path = store.export_favorites(&dir)?;
            println!("Exported to {}", path.display());
        }
        ("import", [file]) => {
            let favorites = store.import_favorites_from_path(Path::new(file)).await?;
            println!("Imported {} favorite(s)", favorites.len());
        }
        _ => {
            println!("{}", USAGE);
            return Err(format!("unknown command or arguments: {} {}", command, rest.join(" ")).into());
        }
    }
    Ok(())
}
