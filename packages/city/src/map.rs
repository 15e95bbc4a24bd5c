//! The loaded city map.

use crate::{
    settings::Settings,
    style::{
        StyleData,
        StyleFormat,
        StyleSource,
        style_file_name,
    },
};
use city_data::{
    BlockGrid,
    MapBlockInfo,
    MapDirection,
};
use cmp_format::{
    Header,
    StartupObject,
    ServiceBases,
    District,
    decode_container,
};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use anyhow::{Context, Result};


/// Block grid and auxiliary sections of one map, together with its style.
///
/// Loading replaces everything at once. A failed load leaves the map empty,
/// never partially populated.
#[derive(Debug)]
pub struct GameMap {
    grid: BlockGrid,
    header: Option<Header>,
    startup_objects: Vec<StartupObject>,
    service_bases: ServiceBases,
    districts: Vec<District>,
    style: Option<StyleData>,
    style_format: StyleFormat,
    fix_shifted_bits: bool,
}

impl GameMap {
    pub fn new() -> Self {
        GameMap {
            grid: BlockGrid::new(),
            header: None,
            startup_objects: Vec::new(),
            service_bases: ServiceBases::default(),
            districts: Vec::new(),
            style: None,
            style_format: StyleFormat::default(),
            fix_shifted_bits: false,
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        let mut map = GameMap::new();
        map.style_format = settings.style_format;
        map.fix_shifted_bits = settings.fix_shifted_bits;
        map
    }

    pub fn set_fix_shifted_bits(&mut self, fix_shifted_bits: bool) {
        self.fix_shifted_bits = fix_shifted_bits;
    }

    pub fn set_style_format(&mut self, style_format: StyleFormat) {
        self.style_format = style_format;
    }

    /// Load a map file and its style.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        styles: &mut dyn StyleSource,
    ) -> Result<()> {
        let path = path.as_ref();
        self.cleanup();
        info!("loading map {}", path.display());
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("cannot open map data file {}: {}", path.display(), e);
                return Err(e).with_context(|| format!("cannot open map data file {}", path.display()));
            }
        };
        self.load_from_reader(BufReader::new(file), styles)
            .with_context(|| format!("cannot load map {}", path.display()))
    }

    /// Load a map from an open stream and its style.
    pub fn load_from_reader<R: Read>(
        &mut self,
        read: R,
        styles: &mut dyn StyleSource,
    ) -> Result<()> {
        self.cleanup();
        let result = self.try_load(read, styles);
        if let Err(ref e) = result {
            warn!("map load failed: {:#}", e);
            self.cleanup();
        }
        result
    }

    fn try_load<R: Read>(&mut self, read: R, styles: &mut dyn StyleSource) -> Result<()> {
        let mut container = decode_container(read)
            .context("cannot read map data")?;
        if self.fix_shifted_bits {
            debug!("fixing shifted block bits");
            container.grid.fix_shifted_bits();
        }

        let style_name = style_file_name(container.header.style_number, self.style_format);
        let style = styles.load_style(&style_name)
            .with_context(|| format!("cannot load style {}", style_name))?;

        self.grid = container.grid;
        self.header = Some(container.header);
        self.startup_objects = container.startup_objects;
        self.service_bases = container.service_bases;
        self.districts = container.districts;
        self.style = Some(style);
        info!(
            "loaded map: {} startup objects, {} districts, style {}",
            self.startup_objects.len(),
            self.districts.len(),
            style_name,
        );
        Ok(())
    }

    /// Forget the loaded map, leaving every block air.
    pub fn cleanup(&mut self) {
        self.grid.clear();
        self.header = None;
        self.startup_objects.clear();
        self.service_bases = ServiceBases::default();
        self.districts.clear();
        self.style = None;
    }

    /// Whether a map and its style are loaded.
    pub fn is_loaded(&self) -> bool {
        self.style.is_some()
    }

    /// Block at coordinates clamped into the map. Never fails, positions off
    /// the map edge see the edge blocks.
    pub fn get_block_info(&self, x: i32, y: i32, layer: i32) -> &MapBlockInfo {
        self.grid.get_clamp(x, y, layer)
    }

    /// Block at exact coordinates, `None` if outside the map.
    pub fn get_block(&self, x: i32, y: i32, layer: i32) -> Option<&MapBlockInfo> {
        self.grid.get(x, y, layer)
    }

    pub fn get_neighbour_block(
        &self,
        x: i32,
        y: i32,
        layer: i32,
        direction: MapDirection,
    ) -> &MapBlockInfo {
        self.grid.get_neighbour(x, y, layer, direction)
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn startup_objects(&self) -> &[StartupObject] {
        &self.startup_objects
    }

    pub fn service_bases(&self) -> &ServiceBases {
        &self.service_bases
    }

    /// Non-empty districts, smallest first.
    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn style(&self) -> Option<&StyleData> {
        self.style.as_ref()
    }
}

impl Default for GameMap {
    fn default() -> Self {
        GameMap::new()
    }
}


#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use anyhow::bail;
    use cmp_format::RawContainer;

    /// Style source answering every request with the same counts, or
    /// failing.
    pub struct FakeStyles {
        pub style: Option<StyleData>,
        pub requested: Vec<String>,
    }

    impl FakeStyles {
        pub fn new() -> Self {
            FakeStyles {
                style: Some(StyleData {
                    side_blocks_count: 8,
                    lid_blocks_count: 8,
                    aux_blocks_count: 0,
                }),
                requested: Vec::new(),
            }
        }

        pub fn failing() -> Self {
            FakeStyles { style: None, requested: Vec::new() }
        }
    }

    impl StyleSource for FakeStyles {
        fn load_style(&mut self, name: &str) -> Result<StyleData> {
            self.requested.push(name.to_owned());
            match self.style {
                Some(style) => Ok(style),
                None => bail!("no style named {}", name),
            }
        }
    }

    /// Map loaded from `raw`.
    pub fn loaded_map(raw: &RawContainer) -> GameMap {
        let mut map = GameMap::new();
        map.load_from_reader(&raw.to_bytes().unwrap()[..], &mut FakeStyles::new())
            .unwrap();
        map
    }
}

#[cfg(test)]
use self::test_util::*;
#[cfg(test)]
use city_data::{GroundType, TrafficHint, MAP_DIMENSIONS, MAP_LAYERS_COUNT};
#[cfg(test)]
use cmp_format::RawContainer;

#[cfg(test)]
fn sample_raw() -> RawContainer {
    let mut grid = BlockGrid::new();
    *grid.get_mut(0, MAP_DIMENSIONS as i32 - 1, MAP_LAYERS_COUNT as i32 - 1).unwrap() = MapBlockInfo {
        ground_type: GroundType::Building,
        ..MapBlockInfo::default()
    };
    *grid.get_mut(20, 30, 2).unwrap() = MapBlockInfo {
        ground_type: GroundType::Road,
        traffic_hint: TrafficHint::TrafficLights,
        ..MapBlockInfo::default()
    };
    let mut raw = RawContainer::compress(&grid).unwrap();
    raw.style_number = 2;
    raw.startup_objects = vec![StartupObject { x: 5, remap: 200, ..StartupObject::default() }; 3];
    raw.districts = vec![District { x: 0, y: 0, w: 255, h: 255, sample_index: 0, name: "All".into() }];
    raw
}

#[test]
fn load_replaces_everything() {
    let mut styles = FakeStyles::new();
    let mut map = GameMap::new();
    assert!(!map.is_loaded());
    map.load_from_reader(&sample_raw().to_bytes().unwrap()[..], &mut styles).unwrap();

    assert!(map.is_loaded());
    assert_eq!(styles.requested, vec!["STYLE002.G24".to_owned()]);
    assert_eq!(map.header().unwrap().style_number, 2);
    assert_eq!(map.startup_objects().len(), 1);
    assert!(map.startup_objects()[0].is_car());
    assert_eq!(map.districts().len(), 1);
    assert_eq!(map.get_block_info(20, 30, 2).ground_type, GroundType::Road);
    assert_eq!(map.style().unwrap().lid_blocks_count, 8);
}

#[test]
fn block_lookup_clamps() {
    let map = loaded_map(&sample_raw());
    let max = MAP_DIMENSIONS as i32 - 1;
    let top = MAP_LAYERS_COUNT as i32 - 1;
    assert_eq!(map.get_block_info(-5, 999999, 999), map.get_block_info(0, max, top));
    assert_eq!(map.get_block_info(-5, 999999, 999).ground_type, GroundType::Building);
    assert!(map.get_block(-5, 999999, 999).is_none());
    assert_eq!(
        map.get_neighbour_block(21, 31, 2, MapDirection::NW).ground_type,
        GroundType::Road,
    );
}

#[test]
fn failed_load_leaves_map_cleared() {
    let mut map = loaded_map(&sample_raw());
    assert!(map.is_loaded());

    let mut bytes = sample_raw().to_bytes().unwrap();
    bytes.truncate(bytes.len() - 10);
    assert!(map.load_from_reader(&bytes[..], &mut FakeStyles::new()).is_err());
    assert!(!map.is_loaded());
    assert!(map.header().is_none());
    assert!(map.startup_objects().is_empty());
    assert!(map.districts().is_empty());
    assert_eq!(map.grid().count_non_empty(), 0);
}

#[test]
fn style_failure_rolls_back() {
    let mut map = loaded_map(&sample_raw());
    let bytes = sample_raw().to_bytes().unwrap();
    let mut styles = FakeStyles::failing();
    let error = map.load_from_reader(&bytes[..], &mut styles).unwrap_err();
    assert!(format!("{:#}", error).contains("STYLE002.G24"));
    assert!(!map.is_loaded());
    assert_eq!(map.grid().count_non_empty(), 0);
    assert!(map.districts().is_empty());
}

#[test]
fn missing_file_is_an_error() {
    let mut map = GameMap::with_settings(&Settings::default());
    let path = std::env::temp_dir().join("city-no-such-map.CMP");
    assert!(map.load_from_file(&path, &mut FakeStyles::new()).is_err());
    assert!(!map.is_loaded());
}

#[test]
fn shifted_bits_fixed_on_request() {
    let mut map = GameMap::new();
    map.set_fix_shifted_bits(true);
    map.set_style_format(StyleFormat::Gry);
    let mut styles = FakeStyles::new();
    map.load_from_reader(&sample_raw().to_bytes().unwrap()[..], &mut styles).unwrap();
    assert_eq!(styles.requested, vec!["STYLE002.GRY".to_owned()]);

    let moved = map.get_block_info(20, 30, 1);
    assert_eq!(moved.ground_type, GroundType::Road);
    assert_eq!(moved.traffic_hint, TrafficHint::TrafficLights);
    assert!(map.get_block_info(20, 30, 2).is_air());
}
