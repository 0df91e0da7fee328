use std::{io, path::PathBuf};

use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "tinyes-worker", about = "A TinyES index worker node.")]
pub struct CommandLineArgs {
    #[structopt(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum BackendType {
    #[serde(alias = "lsm")]
    Lsm,
    #[serde(alias = "btree")]
    BTree,
}

impl From<BackendType> for tinyes_core::BackendKind {
    fn from(kind: BackendType) -> Self {
        match kind {
            BackendType::Lsm => tinyes_core::BackendKind::Lsm,
            BackendType::BTree => tinyes_core::BackendKind::BTree,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexSettings {
    pub doc_num_estimate: usize,
    pub db_type: BackendType,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// Empty means run standalone, with no service registration.
    #[serde(default)]
    pub etcd_servers: Vec<String>,
    pub heartbeat_frequency_secs: i64,
    #[serde(default)]
    pub prefer_loopback: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service_port: u16,
    pub index: IndexSettings,
    pub registry: RegistrySettings,
}

impl Settings {
    pub fn load(config_path_opt: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path_opt.unwrap_or_else(|| default_config_path().unwrap());
        let config = Config::builder()
            .add_source(File::from(config_path))
            .add_source(Environment::with_prefix("TINYES_WORKER").separator("__"))
            .build()?;

        config
            .try_deserialize()
            .map_err(|err| anyhow!("Failed to read config: {:?}", err))
    }
}

fn default_config_path() -> io::Result<PathBuf> {
    let mut dir = std::env::current_exe()?;
    dir.pop();
    dir.push("configs/tinyes-worker.toml");
    Ok(dir)
}
