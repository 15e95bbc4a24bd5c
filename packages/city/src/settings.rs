
use crate::style::StyleFormat;
use std::{
    path::{Path, PathBuf},
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "settings.json";

/// Default capacity hint for mesh buffers, in vertices and in indices.
pub const DEFAULT_MESH_RESERVE: usize = 1 << 20;


/// Map loading and meshing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory map and style files are resolved against.
    pub data_dir: PathBuf,
    pub style_format: StyleFormat,
    /// Move the shifted road, ground and traffic bits down onto the blocks
    /// they belong to after loading.
    pub fix_shifted_bits: bool,
    pub mesh_vertex_reserve: usize,
    pub mesh_index_reserve: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("gamedata"),
            style_format: StyleFormat::G24,
            fix_shifted_bits: false,
            mesh_vertex_reserve: DEFAULT_MESH_RESERVE,
            mesh_index_reserve: DEFAULT_MESH_RESERVE,
        }
    }
}

impl Settings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self::try_read(path).unwrap_or_default()
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}


#[test]
fn settings_fill_missing_fields() {
    let settings: Settings = serde_json::from_str(r#"{
        "style_format": "Gry",
        "fix_shifted_bits": true
    }"#).unwrap();
    assert_eq!(settings.style_format, StyleFormat::Gry);
    assert!(settings.fix_shifted_bits);
    assert_eq!(settings.data_dir, PathBuf::from("gamedata"));
    assert_eq!(settings.mesh_index_reserve, DEFAULT_MESH_RESERVE);
}

#[test]
fn settings_file_round_trip() {
    let path = std::env::temp_dir().join(format!("city-settings-{}.json", std::process::id()));
    let settings = Settings {
        data_dir: PathBuf::from("/opt/city"),
        mesh_vertex_reserve: 64,
        ..Settings::default()
    };
    settings.write(&path).unwrap();
    assert_eq!(Settings::try_read(&path).unwrap(), settings);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(Settings::read(&path), Settings::default());
}
