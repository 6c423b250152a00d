mod config;
mod file_backend;

use config::DemoConfiguration;
use file_backend::ThreadedFileBackend;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tickload::{LoadEvent, MultiLoader, SingleLoader};

const PROGRESS_BAR_WIDTH: usize = 40;

pub fn default_config_search_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

// The first argument can be a config file or a directory whose files should all be loaded
fn load_configuration() -> Result<DemoConfiguration, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_dir() {
                DemoConfiguration::for_directory(&path)
            } else {
                DemoConfiguration::read_from_path(&path)
            }
        }
        None => DemoConfiguration::locate_config_file(&default_config_search_path()),
    }
}

fn draw_progress_bar(
    progress: f32,
    duration: f32,
) {
    let filled = (progress * PROGRESS_BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    print!(
        "\r[{}{}] {:>5.1}% {:>6.2}s",
        "#".repeat(filled),
        " ".repeat(PROGRESS_BAR_WIDTH - filled),
        progress * 100.0,
        duration
    );
    let _ = std::io::stdout().flush();
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = load_configuration()?;
    log::info!(
        "Loading {} resources from {:?}",
        config.resources.len(),
        config.resource_root
    );

    let backend = Arc::new(ThreadedFileBackend::new(
        config.resource_root.clone(),
        config.worker_count,
        config.chunk_size,
        config.chunk_delay,
    )?);
    let delta = config.tick.as_secs_f32();

    // The first resource doubles as a splash screen, loaded on its own before everything else
    if let Some(splash_id) = config.resources.first() {
        let mut splash = SingleLoader::<Vec<u8>>::new(splash_id.clone(), backend.clone(), 0.0);
        splash.on_asset_load_complete(|data| match data {
            Some(data) => log::info!("Splash loaded ({} bytes)", data.len()),
            None => log::warn!("Splash failed to load"),
        });
        if let Err(e) = splash.start() {
            log::warn!("Splash request failed: {}", e);
        }

        while !splash.is_complete() {
            std::thread::sleep(config.tick);
            splash.advance(delta);
            profiling::finish_frame!();
        }
    }

    let mut loader = MultiLoader::new(
        config.resources.iter().cloned(),
        backend.clone(),
        config.min_load_duration,
    );
    loader.on_item_complete(|item| match item.get::<Vec<u8>>() {
        Some(data) => log::debug!(
            "Single asset load complete: {} ({} bytes)",
            item.id(),
            data.len()
        ),
        None => log::debug!("Single asset load complete: {} (failed)", item.id()),
    });
    loader.on_load_complete(|| log::debug!("MultiLoader load complete"));
    if let Err(e) = loader.start() {
        // The loader records the item as failed and moves on
        log::warn!("First request failed: {}", e);
    }

    loop {
        std::thread::sleep(config.tick);
        loader.advance(delta);

        for event in loader.events().try_iter() {
            match event {
                LoadEvent::ItemComplete { index, id, loaded } => {
                    println!();
                    log::info!(
                        "[{}/{}] {} {}",
                        index + 1,
                        loader.len(),
                        id,
                        if loaded { "loaded" } else { "failed" }
                    );
                }
                LoadEvent::LoadComplete { duration } => {
                    println!();
                    log::info!("All resources finished after {:.2}s", duration);
                }
                LoadEvent::AssetLoadComplete { .. } => {}
            }
        }

        draw_progress_bar(loader.total_progress(), loader.load_duration());
        profiling::finish_frame!();

        if loader.is_complete() {
            break;
        }
    }
    println!();

    let mut total_bytes = 0;
    let mut failed = 0;
    for item in loader.strategy().items() {
        match item.get::<Vec<u8>>() {
            Some(data) => total_bytes += data.len(),
            None => failed += 1,
        }
    }
    log::info!(
        "Loaded {} bytes, {} of {} resources failed",
        total_bytes,
        failed,
        loader.len()
    );

    Ok(())
}

fn main() {
    // Setup logging
    env_logger::Builder::default()
        .write_style(env_logger::WriteStyle::Always)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
