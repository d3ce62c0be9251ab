use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dispatch_engine::{CatalogLoader, Character, Mission, TagDictionary, UserState};
use thiserror::Error;

pub const SAMPLE_TAGS: &str = include_str!("../data/tags.json");
pub const SAMPLE_CHARACTERS: &str = include_str!("../data/characters.json");
pub const SAMPLE_MISSIONS: &str = include_str!("../data/missions.json");
pub const SAMPLE_ROSTER: &str = include_str!("../data/roster.json");

pub const TAGS_FILE: &str = "tags.json";
pub const CHARACTERS_FILE: &str = "characters.json";
pub const MISSIONS_FILE: &str = "missions.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the three catalog files from one directory.
#[derive(Debug, Clone)]
pub struct FsCatalogLoader {
    dir: PathBuf,
}

impl FsCatalogLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T>(
        &self,
        file: &str,
        parse: fn(&str) -> Result<T, serde_json::Error>,
    ) -> Result<T, LoadError> {
        let path = self.dir.join(file);
        let text = read_text(&path)?;
        parse(&text).map_err(|source| LoadError::Parse { path, source })
    }
}

impl CatalogLoader for FsCatalogLoader {
    type Error = LoadError;

    fn load_tag_dictionary(&self) -> Result<TagDictionary, Self::Error> {
        self.read(TAGS_FILE, TagDictionary::from_json)
    }

    fn load_characters(&self) -> Result<Vec<Character>, Self::Error> {
        self.read(CHARACTERS_FILE, Character::list_from_json)
    }

    fn load_missions(&self) -> Result<Vec<Mission>, Self::Error> {
        self.read(MISSIONS_FILE, Mission::list_from_json)
    }
}

/// Sample catalog compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalogLoader;

impl CatalogLoader for EmbeddedCatalogLoader {
    type Error = serde_json::Error;

    fn load_tag_dictionary(&self) -> Result<TagDictionary, Self::Error> {
        TagDictionary::from_json(SAMPLE_TAGS)
    }

    fn load_characters(&self) -> Result<Vec<Character>, Self::Error> {
        Character::list_from_json(SAMPLE_CHARACTERS)
    }

    fn load_missions(&self) -> Result<Vec<Mission>, Self::Error> {
        Mission::list_from_json(SAMPLE_MISSIONS)
    }
}

/// Roster from `path`, or the embedded sample roster.
pub fn load_roster(path: Option<&Path>) -> Result<UserState, LoadError> {
    match path {
        Some(path) => {
            let text = read_text(path)?;
            UserState::from_json(&text).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
        None => UserState::from_json(SAMPLE_ROSTER).map_err(|source| LoadError::Parse {
            path: PathBuf::from("<embedded roster>"),
            source,
        }),
    }
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
