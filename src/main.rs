mod config;
mod paths;
mod save_sync;
mod savegame;
mod util;
mod watcher;

use crate::config::{MappingSource, MappingStore, load_cfg, save_cfg};
use crate::paths::{PATH_DATA, expand_path};
use crate::save_sync::{
    ChangeQueue, ExecutionContext, LockPolicy, SyncEngine, list_saves, pair_status,
    save_file_name,
};
use crate::savegame::open_save;
use crate::util::{format_file_size, format_playtime};
use crate::watcher::{SaveWatcher, SyncWorker};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help") {
        println!("{}", USAGE_TEXT);
        std::process::exit(0);
    }

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Value following `flag`, exiting with the usage text when it is missing
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let index = args.iter().position(|arg| arg == flag)?;
    match args.get(index + 1) {
        Some(value) => Some(value.as_str()),
        None => {
            eprintln!("{}", USAGE_TEXT);
            std::process::exit(1);
        }
    }
}

/// Returns false when the command ran but some saves failed to sync
fn run(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let mut cfg = load_cfg();
    let mappings = MappingStore::new(&PATH_DATA);
    let saves_dir = match flag_value(args, "--saves-dir") {
        Some(dir) => expand_path(dir),
        None => cfg.saves_dir(),
    };

    if let Some(dir) = flag_value(args, "--set-saves-dir") {
        let dir_path = expand_path(dir);
        if !dir_path.is_dir() {
            log::warn!("{} does not exist yet", dir_path.display());
        }
        cfg.saves_dir = Some(dir.to_string());
        save_cfg(&cfg)?;
        log::info!("Saves directory is now {}", dir_path.display());
        return Ok(true);
    }

    if let Some(file) = flag_value(args, "--info") {
        print_info(Path::new(file))?;
        return Ok(true);
    }

    if let Some(index) = args.iter().position(|arg| arg == "--add") {
        let (Some(name), Some(dir)) = (args.get(index + 1), args.get(index + 2)) else {
            eprintln!("{}", USAGE_TEXT);
            std::process::exit(1);
        };
        let dir = expand_path(dir);
        mappings.add(name, &dir)?;
        if !dir.is_dir() {
            log::warn!("{} does not exist yet", dir.display());
        }
        log::info!("'{}' now syncs with {}", name, dir.display());
        return Ok(true);
    }

    if let Some(name) = flag_value(args, "--remove") {
        if mappings.remove(name)? {
            log::info!("'{}' is no longer synced", name);
        } else {
            log::warn!("'{}' was not configured", name);
        }
        return Ok(true);
    }

    if args.iter().any(|arg| arg == "--list") {
        print_status(&saves_dir, &mappings);
        return Ok(true);
    }

    if !saves_dir.is_dir() {
        return Err(format!("Saves directory {} does not exist", saves_dir.display()).into());
    }

    let context = if args.iter().any(|arg| arg == "--no-wait") {
        ExecutionContext::Interactive
    } else {
        ExecutionContext::Background
    };
    let policy = LockPolicy {
        attempts: cfg.lock_attempts,
        delay: cfg.lock_delay(),
        context,
    };
    let queue = Arc::new(ChangeQueue::new());
    let engine = SyncEngine::new(saves_dir.clone(), mappings.clone(), Arc::clone(&queue), policy);

    if args.iter().any(|arg| arg == "--sync-all") {
        let report = engine.process_all();
        for (path, e) in report.failures() {
            log::error!("{}: {}", path.display(), e);
        }
        return Ok(report.is_success());
    }

    log::info!("Saves directory: {}", saves_dir.display());
    let worker = SyncWorker::spawn(engine)?;
    let watcher = SaveWatcher::new(
        &saves_dir,
        mappings.path(),
        mappings.clone(),
        queue,
        worker.waker(),
    )?;

    // Runs until the process is interrupted
    watcher.run();
    worker.shutdown();
    Ok(true)
}

fn print_info(file: &Path) -> Result<(), Box<dyn Error>> {
    let save = match open_save(file) {
        Ok(save) => save,
        Err(e) => {
            if let Some(version) = e.version() {
                println!("Version:  {}", version);
            }
            return Err(e.into());
        }
    };
    let size = std::fs::metadata(file)?.len();
    println!("File:     {}", file.display());
    println!("Size:     {}", format_file_size(size));
    println!("Version:  {}", save.version);
    println!("Scenario: {}", save.scenario);
    println!("Playtime: {}", format_playtime(save.playtime_seconds));
    Ok(())
}

fn print_status(saves_dir: &Path, mappings: &MappingStore) {
    let names = list_saves(saves_dir);
    if names.is_empty() {
        println!("No saves in {}", saves_dir.display());
        return;
    }
    for name in names {
        let sync_dir: Option<PathBuf> = mappings.read(&name);
        let status = pair_status(&name, saves_dir, sync_dir.as_deref());
        let size = std::fs::metadata(saves_dir.join(save_file_name(&name)))
            .map(|m| format_file_size(m.len()))
            .unwrap_or_default();
        match sync_dir {
            Some(dir) => println!(
                "{:<32} {:>10}  {} ({})",
                name,
                size,
                status.describe(),
                dir.display()
            ),
            None => println!("{:<32} {:>10}  {}", name, size, status.describe()),
        }
    }
}

static USAGE_TEXT: &str = r#"
Usage: savesync [OPTIONS]

Keeps game saves in step with copies in cloud-synced directories. The copy with
more playtime wins; the loser is backed up first when it was written by an
older build of the same game release.

Options:
    --watch                 Sync everything, then keep watching for changes (default)
    --sync-all              Sync every configured save once and exit
    --list                  Show every local save and whether it is in sync
    --info <file>           Print the version, scenario and playtime of a save
    --add <name> <dir>      Sync the save <name> with the directory <dir>
    --remove <name>         Stop syncing the save <name>
    --saves-dir <dir>       Use <dir> instead of the configured saves directory
    --set-saves-dir <dir>   Store <dir> as the saves directory in settings.json
    --no-wait               Fail at once instead of waiting for saves still being written
    --help                  Show this text

Set RUST_LOG=debug for more output.
"#;
