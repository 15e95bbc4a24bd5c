//! Startup objects, service bases and districts.

use crate::{
    error::*,
    reader::CmpReader,
    writer::CmpWriter,
};
use city_data::{MAP_LAYERS_COUNT, invert_layer};
use std::{
    collections::BTreeSet,
    io::{Read, Write},
};
use tracing::{debug, trace, warn};
use vek::*;


/// Size of one startup object record in bytes.
pub const STARTUP_OBJECT_RECORD_LEN: usize = 14;

/// Size of the service location block in bytes.
pub const SERVICE_LOCATIONS_LEN: usize = 108;

/// Slots per service location table.
pub const SERVICE_SLOTS: usize = 6;

/// Size of one district record in bytes.
pub const DISTRICT_RECORD_LEN: usize = 36;

/// Size of a district's fixed name buffer in bytes.
pub const DISTRICT_NAME_LEN: usize = 30;


/// Object placed in the world when the map starts.
///
/// Ordered field by field so it can key a `BTreeSet`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StartupObject {
    pub x: u16,
    pub y: u16,
    pub z: u16,
    pub object_type: u8,
    pub remap: u8,
    pub rotation: u16,
    pub pitch: u16,
    pub roll: u16,
}

impl StartupObject {
    /// Remaps from 128 up mark the object as a car.
    pub fn is_car(&self) -> bool {
        self.remap >= 128
    }

    pub fn read<R: Read>(reader: &mut CmpReader<R>) -> Result<Self> {
        Ok(StartupObject {
            x: reader.read_u16()?,
            y: reader.read_u16()?,
            z: reader.read_u16()?,
            object_type: reader.read_u8()?,
            remap: reader.read_u8()?,
            rotation: reader.read_u16()?,
            pitch: reader.read_u16()?,
            roll: reader.read_u16()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut CmpWriter<W>) -> Result<()> {
        writer.write_u16(self.x)?;
        writer.write_u16(self.y)?;
        writer.write_u16(self.z)?;
        writer.write_u8(self.object_type)?;
        writer.write_u8(self.remap)?;
        writer.write_u16(self.rotation)?;
        writer.write_u16(self.pitch)?;
        writer.write_u16(self.roll)?;
        Ok(())
    }
}

/// Read `count` startup objects. Maps ship with exact duplicates, those are
/// collapsed into one.
pub fn read_startup_objects<R: Read>(
    reader: &mut CmpReader<R>,
    count: usize,
) -> Result<Vec<StartupObject>> {
    let mut objects = BTreeSet::new();
    for _ in 0..count {
        objects.insert(StartupObject::read(reader)?);
    }
    if objects.len() < count {
        debug!("dropped {} duplicate startup objects", count - objects.len());
    }
    Ok(objects.into_iter().collect())
}


/// Kind of emergency service with bases on the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Police,
    Hospital,
    Fire,
}

/// Service each table of the location block belongs to, in storage order.
const SERVICE_TABLES: [Option<ServiceKind>; 6] = [
    Some(ServiceKind::Police),
    Some(ServiceKind::Hospital),
    None,
    None,
    Some(ServiceKind::Fire),
    None,
];

/// Block positions of the police, hospital and fire bases. `z` is a layer
/// index counted from the bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceBases {
    pub police: Vec<Vec3<i32>>,
    pub hospital: Vec<Vec3<i32>>,
    pub fire: Vec<Vec3<i32>>,
}

impl ServiceBases {
    pub fn get(&self, kind: ServiceKind) -> &[Vec3<i32>] {
        match kind {
            ServiceKind::Police => &self.police,
            ServiceKind::Hospital => &self.hospital,
            ServiceKind::Fire => &self.fire,
        }
    }

    fn get_mut(&mut self, kind: ServiceKind) -> &mut Vec<Vec3<i32>> {
        match kind {
            ServiceKind::Police => &mut self.police,
            ServiceKind::Hospital => &mut self.hospital,
            ServiceKind::Fire => &mut self.fire,
        }
    }

    /// Read the fixed-size location block. All-zero slots are unset. Stored
    /// layers count from the top.
    pub fn read<R: Read>(reader: &mut CmpReader<R>) -> Result<Self> {
        let mut bases = ServiceBases::default();
        for table in SERVICE_TABLES {
            for _ in 0..SERVICE_SLOTS {
                let offset = reader.offset();
                let [x, y, z] = reader.read_array::<3>()?;
                if x == 0 && y == 0 && z == 0 {
                    continue;
                }
                ensure!(
                    (z as usize) < MAP_LAYERS_COUNT,
                    MalformedData, Some(offset),
                    "service location <{}, {}> on layer {}", x, y, z,
                );
                if let Some(kind) = table {
                    let layer = invert_layer(z as usize) as i32;
                    bases.get_mut(kind).push(Vec3::new(x as i32, y as i32, layer));
                }
            }
        }
        Ok(bases)
    }

    /// Write the location block. Bases beyond the slot count of their table
    /// are dropped.
    pub fn write<W: Write>(&self, writer: &mut CmpWriter<W>) -> Result<()> {
        for table in SERVICE_TABLES {
            let bases = table.map(|kind| self.get(kind)).unwrap_or(&[]);
            if bases.len() > SERVICE_SLOTS {
                warn!("{} service bases do not fit {} slots", bases.len(), SERVICE_SLOTS);
            }
            for slot in 0..SERVICE_SLOTS {
                let triple = match bases.get(slot) {
                    Some(base) => [
                        base.x as u8,
                        base.y as u8,
                        invert_layer(base.z.clamp(0, MAP_LAYERS_COUNT as i32 - 1) as usize) as u8,
                    ],
                    None => [0; 3],
                };
                writer.write_bytes(&triple)?;
            }
        }
        Ok(())
    }
}


/// Named rectangle of the map, used to pick area names and ambient sounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct District {
    pub x: u8,
    pub y: u8,
    pub w: u8,
    pub h: u8,
    pub sample_index: u8,
    pub name: String,
}

impl District {
    /// Whether block `<x, y>` lies inside. The far edges are exclusive.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x as i32
            && x < self.x as i32 + self.w as i32
            && y >= self.y as i32
            && y < self.y as i32 + self.h as i32
    }

    pub fn rect(&self) -> Rect<i32, i32> {
        Rect::new(self.x as i32, self.y as i32, self.w as i32, self.h as i32)
    }

    pub fn read<R: Read>(reader: &mut CmpReader<R>) -> Result<Self> {
        let [x, y, w, h, sample_index] = reader.read_array::<5>()?;
        let name_buf = reader.read_array::<DISTRICT_NAME_LEN>()?;
        let _reserved = reader.read_u8()?;
        let name_len = name_buf.iter().position(|&b| b == 0).unwrap_or(DISTRICT_NAME_LEN);
        Ok(District {
            x,
            y,
            w,
            h,
            sample_index,
            name: String::from_utf8_lossy(&name_buf[..name_len]).into_owned(),
        })
    }

    /// Write the record. Names longer than the buffer are cut off.
    pub fn write<W: Write>(&self, writer: &mut CmpWriter<W>) -> Result<()> {
        writer.write_bytes(&[self.x, self.y, self.w, self.h, self.sample_index])?;
        let mut name_buf = [0; DISTRICT_NAME_LEN];
        let name = self.name.as_bytes();
        let name_len = name.len().min(DISTRICT_NAME_LEN);
        name_buf[..name_len].copy_from_slice(&name[..name_len]);
        writer.write_bytes(&name_buf)?;
        writer.write_u8(0)?;
        Ok(())
    }
}

/// Read `count` district records. Records of zero area are dropped, the rest
/// are sorted by width then height so that smaller districts come first.
pub fn read_districts<R: Read>(
    reader: &mut CmpReader<R>,
    count: usize,
) -> Result<Vec<District>> {
    let mut districts = Vec::new();
    for _ in 0..count {
        let district = District::read(reader)?;
        if district.w == 0 || district.h == 0 {
            trace!("dropping empty district {:?}", district.name);
            continue;
        }
        districts.push(district);
    }
    districts.sort_by_key(|district| (district.w, district.h));
    Ok(districts)
}


#[test]
fn startup_objects_are_deduplicated() {
    let car = StartupObject { x: 1, y: 2, z: 3, object_type: 4, remap: 130, ..Default::default() };
    let lamp = StartupObject { x: 9, object_type: 1, ..Default::default() };
    let mut writer = CmpWriter::new(Vec::new());
    for object in [car, lamp, car] {
        object.write(&mut writer).unwrap();
    }
    let bytes = writer.into_inner();
    assert_eq!(bytes.len(), 3 * STARTUP_OBJECT_RECORD_LEN);

    let objects = read_startup_objects(&mut CmpReader::new(&bytes[..]), 3).unwrap();
    assert_eq!(objects.len(), 2);
    assert!(objects.contains(&car));
    assert!(objects.contains(&lamp));
    assert!(car.is_car());
    assert!(!lamp.is_car());
}

#[test]
fn service_locations_skip_unset_and_invert_layer() {
    let mut bytes = vec![0; SERVICE_LOCATIONS_LEN];
    // police slot 0
    bytes[0..3].copy_from_slice(&[10, 20, 1]);
    // unused table 2, slot 0
    bytes[36..39].copy_from_slice(&[5, 5, 5]);
    // fire slot 1
    bytes[75..78].copy_from_slice(&[30, 40, 0]);

    let mut reader = CmpReader::new(&bytes[..]);
    let bases = ServiceBases::read(&mut reader).unwrap();
    assert_eq!(reader.offset(), SERVICE_LOCATIONS_LEN as u64);
    assert_eq!(bases.police, vec![Vec3::new(10, 20, 4)]);
    assert!(bases.hospital.is_empty());
    assert_eq!(bases.get(ServiceKind::Fire), &[Vec3::new(30, 40, 5)]);

    let mut writer = CmpWriter::new(Vec::new());
    bases.write(&mut writer).unwrap();
    let written = writer.into_inner();
    assert_eq!(ServiceBases::read(&mut CmpReader::new(&written[..])).unwrap(), bases);
}

#[test]
fn service_location_layer_out_of_range() {
    let mut bytes = vec![0; SERVICE_LOCATIONS_LEN];
    bytes[3..6].copy_from_slice(&[1, 1, 6]);
    let error = ServiceBases::read(&mut CmpReader::new(&bytes[..])).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MalformedData);
    assert_eq!(error.offset(), Some(3));
}

#[test]
fn districts_sorted_smallest_first() {
    let large = District { x: 0, y: 0, w: 10, h: 10, sample_index: 1, name: "Downtown".into() };
    let small = District { x: 2, y: 2, w: 5, h: 5, sample_index: 2, name: "Park".into() };
    let empty = District { x: 7, y: 7, w: 0, h: 3, sample_index: 3, name: "Nowhere".into() };
    let mut writer = CmpWriter::new(Vec::new());
    for district in [&large, &empty, &small] {
        district.write(&mut writer).unwrap();
    }
    let bytes = writer.into_inner();
    assert_eq!(bytes.len(), 3 * DISTRICT_RECORD_LEN);

    let districts = read_districts(&mut CmpReader::new(&bytes[..]), 3).unwrap();
    assert_eq!(districts, vec![small.clone(), large.clone()]);
    assert!(small.contains(2, 6));
    assert!(!small.contains(7, 2));
    assert!(!small.contains(1, 2));
}
