use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tickload::ResourceId;

pub const CONFIG_FILE_NAME: &str = "tickload_demo.json";

fn default_tick_millis() -> u64 {
    16
}

fn default_worker_count() -> usize {
    2
}

fn default_chunk_size() -> usize {
    64 * 1024
}

#[derive(Serialize, Deserialize)]
pub struct DemoConfigurationJson {
    pub resource_root: String,
    pub resources: Vec<String>,
    #[serde(default)]
    pub min_load_duration: f32,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    // Sleep after each chunk so that progress is visible with small files
    #[serde(default)]
    pub chunk_delay_millis: u64,
}

#[derive(Debug, Clone)]
pub struct DemoConfiguration {
    // Directory that resource identifiers are relative to
    pub resource_root: PathBuf,
    pub resources: Vec<ResourceId>,
    pub min_load_duration: f32,
    // Simulated frame time
    pub tick: Duration,
    pub worker_count: usize,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl DemoConfiguration {
    pub fn unverified_absolute_path(
        root_path: &Path,
        json_path: &str,
    ) -> PathBuf {
        if Path::new(json_path).is_absolute() {
            PathBuf::from(json_path)
        } else {
            root_path.join(json_path)
        }
    }

    // Loads every file directly inside `resource_root`, in name order
    pub fn for_directory(resource_root: &Path) -> Result<Self, Box<dyn Error>> {
        let resource_root = dunce::canonicalize(resource_root)?;
        let mut resources = Vec::default();
        for entry in std::fs::read_dir(&resource_root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                resources.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        resources.sort();

        Ok(DemoConfiguration {
            resource_root,
            resources: resources.into_iter().map(ResourceId::from).collect(),
            min_load_duration: 2.0,
            tick: Duration::from_millis(default_tick_millis()),
            worker_count: default_worker_count(),
            chunk_size: default_chunk_size(),
            chunk_delay: Duration::from_millis(5),
        })
    }

    pub fn read_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let root_path = dunce::canonicalize(
            path.parent()
                .ok_or_else(|| "Parent of config file path could not be found".to_string())?,
        )?;
        let file_contents = std::fs::read_to_string(path)?;
        let config_file: DemoConfigurationJson = serde_json::from_str(&file_contents)?;

        let resource_root = Self::unverified_absolute_path(&root_path, &config_file.resource_root);
        if !resource_root.is_dir() {
            return Err(format!("resource_root {:?} is not a directory", resource_root).into());
        }

        if !(config_file.min_load_duration >= 0.0) {
            return Err(format!(
                "min_load_duration must be zero or more, got {}",
                config_file.min_load_duration
            )
            .into());
        }

        if config_file.worker_count == 0 {
            return Err("worker_count must be at least 1".into());
        }

        if config_file.chunk_size == 0 {
            return Err("chunk_size must be at least 1".into());
        }

        Ok(DemoConfiguration {
            resource_root: dunce::canonicalize(&resource_root)?,
            resources: config_file
                .resources
                .into_iter()
                .map(ResourceId::from)
                .collect(),
            min_load_duration: config_file.min_load_duration,
            tick: Duration::from_millis(config_file.tick_millis),
            worker_count: config_file.worker_count,
            chunk_size: config_file.chunk_size,
            chunk_delay: Duration::from_millis(config_file.chunk_delay_millis),
        })
    }

    pub fn locate_config_file(search_location: &Path) -> Result<Self, Box<dyn Error>> {
        let mut path = Some(search_location.to_path_buf());
        while let Some(p) = path {
            let joined_path = p.join(CONFIG_FILE_NAME);
            if joined_path.exists() {
                log::info!("Using demo configuration at {:?}", joined_path);
                return Self::read_from_path(&joined_path);
            }

            path = p.parent().map(|x| x.to_path_buf());
        }

        Err(format!(
            "{} could not be located at {:?} or in any of its parent directories",
            CONFIG_FILE_NAME, search_location
        ))?
    }
}
