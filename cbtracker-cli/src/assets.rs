use cbtracker_game::{Catalog, CatalogLoader, UnlockConfig};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../data/challenges.json");
const BUNDLED_UNLOCKS: &str = include_str!("../data/season.json");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
}

fn parse_error(origin: impl Into<String>) -> impl FnOnce(serde_json::Error) -> AssetError {
    let origin = origin.into();
    move |source| AssetError::Parse { origin, source }
}

/// Catalog shipped inside the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl CatalogLoader for BundledCatalog {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::from_json(BUNDLED_CATALOG).map_err(parse_error("bundled challenges.json"))
    }

    fn load_unlock_config(&self) -> Result<UnlockConfig, Self::Error> {
        UnlockConfig::from_json(BUNDLED_UNLOCKS).map_err(parse_error("bundled season.json"))
    }
}

/// Catalog read from user-supplied files. Without an unlock file the
/// bundled rules apply.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    pub catalog: PathBuf,
    pub unlocks: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogLoader for FileCatalog {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        let text = read(&self.catalog)?;
        Catalog::from_json(&text).map_err(parse_error(self.catalog.display().to_string()))
    }

    fn load_unlock_config(&self) -> Result<UnlockConfig, Self::Error> {
        match &self.unlocks {
            Some(path) => {
                let text = read(path)?;
                UnlockConfig::from_json(&text).map_err(parse_error(path.display().to_string()))
            }
            None => BundledCatalog.load_unlock_config(),
        }
    }
}

/// Whichever catalog the command line selected.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    Bundled(BundledCatalog),
    Files(FileCatalog),
}

impl CatalogSource {
    pub fn from_paths(catalog: Option<PathBuf>, unlocks: Option<PathBuf>) -> Self {
        match catalog {
            Some(catalog) => Self::Files(FileCatalog { catalog, unlocks }),
            None => {
                if unlocks.is_some() {
                    log::warn!("--unlocks has no effect without --catalog");
                }
                Self::Bundled(BundledCatalog)
            }
        }
    }
}

impl CatalogLoader for CatalogSource {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        match self {
            Self::Bundled(loader) => loader.load_catalog(),
            Self::Files(loader) => loader.load_catalog(),
        }
    }

    fn load_unlock_config(&self) -> Result<UnlockConfig, Self::Error> {
        match self {
            Self::Bundled(loader) => loader.load_unlock_config(),
            Self::Files(loader) => loader.load_unlock_config(),
        }
    }
}
