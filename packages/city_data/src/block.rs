//! Attributes of a single map block, and packing them to and from the bit
//! layout of block records.

use crate::{
    axis::{Face, PerFace},
    slope::MAX_SLOPE_TYPE,
};
use std::fmt::{self, Formatter, Display};


// bits of the 16-bit type_map word
const TYPE_MAP_UP: u16 = 0x01;
const TYPE_MAP_DOWN: u16 = 0x02;
const TYPE_MAP_LEFT: u16 = 0x04;
const TYPE_MAP_RIGHT: u16 = 0x08;
const TYPE_MAP_GROUND_SHIFT: u16 = 4;
const TYPE_MAP_GROUND_MASK: u16 = 0x07;
const TYPE_MAP_FLAT: u16 = 0x80;
const TYPE_MAP_SLOPE_SHIFT: u16 = 8;
const TYPE_MAP_SLOPE_MASK: u16 = 0x3f;
const TYPE_MAP_LID_ROTATION_SHIFT: u16 = 14;
const TYPE_MAP_LID_ROTATION_MASK: u16 = 0x03;

// bits of the 8-bit type_map_ext byte
const TYPE_MAP_EXT_TRAFFIC_MASK: u8 = 0x07;
const TYPE_MAP_EXT_REMAP_SHIFT: u8 = 3;
const TYPE_MAP_EXT_REMAP_MASK: u8 = 0x03;
const TYPE_MAP_EXT_FLIP_TOP_BOTTOM: u8 = 0x20;
const TYPE_MAP_EXT_FLIP_LEFT_RIGHT: u8 = 0x40;
const TYPE_MAP_EXT_RAILWAY: u8 = 0x80;


/// Ground type of a block, as used by gameplay and height queries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(u8)]
pub enum GroundType {
    #[default]
    Air = 0,
    Water = 1,
    Road = 2,
    Pavement = 3,
    Field = 4,
    Building = 5,
}

impl GroundType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => GroundType::Air,
            1 => GroundType::Water,
            2 => GroundType::Road,
            3 => GroundType::Pavement,
            4 => GroundType::Field,
            5 => GroundType::Building,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Rotation of the lid texture, in quarter turns.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(u8)]
pub enum LidRotation {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
}

impl LidRotation {
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns & 0x03 {
            0 => LidRotation::Deg0,
            1 => LidRotation::Deg90,
            2 => LidRotation::Deg180,
            _ => LidRotation::Deg270,
        }
    }

    pub fn quarter_turns(self) -> usize {
        self as usize
    }
}

/// Traffic / railway hint stored in the low bits of the extension byte.
///
/// Codes 2 and 3 are never used by valid data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(u8)]
pub enum TrafficHint {
    #[default]
    None = 0,
    TrafficLights = 1,
    TrainTurnEnd = 4,
    TrainTurnStart = 5,
    TrainStationEnd = 6,
    TrainStationStart = 7,
}

impl TrafficHint {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => TrafficHint::None,
            1 => TrafficHint::TrafficLights,
            4 => TrafficHint::TrainTurnEnd,
            5 => TrafficHint::TrainTurnStart,
            6 => TrafficHint::TrainStationEnd,
            7 => TrafficHint::TrainStationStart,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Which texture set a face index refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BlockType {
    Side,
    Lid,
    Aux,
}

impl From<Face> for BlockType {
    fn from(face: Face) -> Self {
        match face {
            Face::Lid => BlockType::Lid,
            _ => BlockType::Side,
        }
    }
}


/// One 1x1x1 cell of the city.
///
/// The direction bits, ground type and traffic hint are stored one layer
/// above the block they visually belong to. See
/// `BlockGrid::fix_shifted_bits`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct MapBlockInfo {
    pub up_direction: bool,
    pub down_direction: bool,
    pub left_direction: bool,
    pub right_direction: bool,
    pub ground_type: GroundType,
    /// Drawn as a flat decal rather than a cube.
    pub is_flat: bool,
    /// 0 is a flat top, 1 through 44 select a ramp.
    pub slope_type: u8,
    pub lid_rotation: LidRotation,
    pub traffic_hint: TrafficHint,
    /// Palette remap of the lid, 0 through 3.
    pub remap: u8,
    pub flip_top_bottom_faces: bool,
    pub flip_left_right_faces: bool,
    pub is_railway: bool,
    /// Texture index per face, 0 means the face is not drawn.
    pub faces: PerFace<u8>,
}

impl MapBlockInfo {
    /// Unpack a block record's bit fields.
    pub fn from_raw(
        type_map: u16,
        type_map_ext: u8,
        faces: [u8; 5],
    ) -> Result<Self, InvalidBlockBits> {
        let ground_code = ((type_map >> TYPE_MAP_GROUND_SHIFT) & TYPE_MAP_GROUND_MASK) as u8;
        let ground_type = GroundType::from_code(ground_code)
            .ok_or(InvalidBlockBits::GroundType(ground_code))?;

        let slope_type = ((type_map >> TYPE_MAP_SLOPE_SHIFT) & TYPE_MAP_SLOPE_MASK) as u8;
        if slope_type > MAX_SLOPE_TYPE {
            return Err(InvalidBlockBits::SlopeType(slope_type));
        }

        let traffic_code = type_map_ext & TYPE_MAP_EXT_TRAFFIC_MASK;
        let traffic_hint = TrafficHint::from_code(traffic_code)
            .ok_or(InvalidBlockBits::TrafficHint(traffic_code))?;

        Ok(MapBlockInfo {
            up_direction: type_map & TYPE_MAP_UP != 0,
            down_direction: type_map & TYPE_MAP_DOWN != 0,
            left_direction: type_map & TYPE_MAP_LEFT != 0,
            right_direction: type_map & TYPE_MAP_RIGHT != 0,
            ground_type,
            is_flat: type_map & TYPE_MAP_FLAT != 0,
            slope_type,
            lid_rotation: LidRotation::from_quarter_turns(
                ((type_map >> TYPE_MAP_LID_ROTATION_SHIFT) & TYPE_MAP_LID_ROTATION_MASK) as u8
            ),
            traffic_hint,
            remap: (type_map_ext >> TYPE_MAP_EXT_REMAP_SHIFT) & TYPE_MAP_EXT_REMAP_MASK,
            flip_top_bottom_faces: type_map_ext & TYPE_MAP_EXT_FLIP_TOP_BOTTOM != 0,
            flip_left_right_faces: type_map_ext & TYPE_MAP_EXT_FLIP_LEFT_RIGHT != 0,
            is_railway: type_map_ext & TYPE_MAP_EXT_RAILWAY != 0,
            faces: PerFace(faces),
        })
    }

    /// Pack into `(type_map, type_map_ext, faces)`. Inverse of `from_raw`
    /// for every value `from_raw` can produce.
    pub fn to_raw(&self) -> (u16, u8, [u8; 5]) {
        let mut type_map = 0;
        if self.up_direction { type_map |= TYPE_MAP_UP; }
        if self.down_direction { type_map |= TYPE_MAP_DOWN; }
        if self.left_direction { type_map |= TYPE_MAP_LEFT; }
        if self.right_direction { type_map |= TYPE_MAP_RIGHT; }
        type_map |= (self.ground_type.code() as u16 & TYPE_MAP_GROUND_MASK) << TYPE_MAP_GROUND_SHIFT;
        if self.is_flat { type_map |= TYPE_MAP_FLAT; }
        type_map |= (self.slope_type as u16 & TYPE_MAP_SLOPE_MASK) << TYPE_MAP_SLOPE_SHIFT;
        type_map |= (self.lid_rotation.quarter_turns() as u16) << TYPE_MAP_LID_ROTATION_SHIFT;

        let mut type_map_ext = self.traffic_hint.code() & TYPE_MAP_EXT_TRAFFIC_MASK;
        type_map_ext |= (self.remap & TYPE_MAP_EXT_REMAP_MASK) << TYPE_MAP_EXT_REMAP_SHIFT;
        if self.flip_top_bottom_faces { type_map_ext |= TYPE_MAP_EXT_FLIP_TOP_BOTTOM; }
        if self.flip_left_right_faces { type_map_ext |= TYPE_MAP_EXT_FLIP_LEFT_RIGHT; }
        if self.is_railway { type_map_ext |= TYPE_MAP_EXT_RAILWAY; }

        (type_map, type_map_ext, self.faces.0)
    }

    pub fn is_air(&self) -> bool {
        self.ground_type == GroundType::Air
    }

    pub fn has_face(&self, face: Face) -> bool {
        self.faces[face] != 0
    }

    pub fn has_slope(&self) -> bool {
        self.slope_type != 0
    }
}


/// A block record bit field held a value no block may have.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvalidBlockBits {
    GroundType(u8),
    SlopeType(u8),
    TrafficHint(u8),
}

impl Display for InvalidBlockBits {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            InvalidBlockBits::GroundType(n) => write!(f, "invalid ground type code {}", n),
            InvalidBlockBits::SlopeType(n) => write!(f, "invalid slope type {}", n),
            InvalidBlockBits::TrafficHint(n) => write!(f, "invalid traffic hint code {}", n),
        }
    }
}

impl std::error::Error for InvalidBlockBits {}


#[test]
fn unpack_type_map_bits() {
    // up + right, building, flat, slope 9, rotation 270
    let type_map = 0x01 | 0x08 | (5 << 4) | 0x80 | (9 << 8) | (3 << 14);
    // traffic lights, remap 2, flip left/right, railway
    let type_map_ext = 1 | (2 << 3) | 0x40 | 0x80;
    let block = MapBlockInfo::from_raw(type_map, type_map_ext, [1, 2, 3, 4, 5]).unwrap();

    assert!(block.up_direction);
    assert!(!block.down_direction);
    assert!(!block.left_direction);
    assert!(block.right_direction);
    assert_eq!(block.ground_type, GroundType::Building);
    assert!(block.is_flat);
    assert_eq!(block.slope_type, 9);
    assert_eq!(block.lid_rotation, LidRotation::Deg270);
    assert_eq!(block.traffic_hint, TrafficHint::TrafficLights);
    assert_eq!(block.remap, 2);
    assert!(!block.flip_top_bottom_faces);
    assert!(block.flip_left_right_faces);
    assert!(block.is_railway);
    assert_eq!(block.faces[Face::W], 1);
    assert_eq!(block.faces[Face::Lid], 5);

    assert_eq!(block.to_raw(), (type_map, type_map_ext, [1, 2, 3, 4, 5]));
}

#[test]
fn reject_invalid_codes() {
    assert_eq!(
        MapBlockInfo::from_raw(0, 2, [0; 5]),
        Err(InvalidBlockBits::TrafficHint(2)),
    );
    assert_eq!(
        MapBlockInfo::from_raw(0, 3, [0; 5]),
        Err(InvalidBlockBits::TrafficHint(3)),
    );
    assert_eq!(
        MapBlockInfo::from_raw(6 << 4, 0, [0; 5]),
        Err(InvalidBlockBits::GroundType(6)),
    );
    assert_eq!(
        MapBlockInfo::from_raw(45 << 8, 0, [0; 5]),
        Err(InvalidBlockBits::SlopeType(45)),
    );
    assert_eq!(
        MapBlockInfo::from_raw(0, 7, [0; 5]).unwrap().traffic_hint,
        TrafficHint::TrainStationStart,
    );
}

#[test]
fn zeroed_record_is_default_air() {
    let block = MapBlockInfo::from_raw(0, 0, [0; 5]).unwrap();
    assert_eq!(block, MapBlockInfo::default());
    assert!(block.is_air());
    assert!(!block.has_slope());
}
