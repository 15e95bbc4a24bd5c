//! Enums for block faces and compass directions on the map plane.

use std::ops::{
    Index,
    IndexMut,
};
use vek::*;


macro_rules! axis_enum {
    (
        $name:ident,
        $num_constant:ident = $num:expr,
        $per_name:ident,
        $all_constant:ident,
        ($(
            $variant:ident,
        )*),
    )=>{
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(u8)]
        pub enum $name {$(
            $variant,
        )*}

        pub const $num_constant: usize = $num;

        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
        pub struct $per_name<T>(pub [T; $num_constant]);

        pub const $all_constant: $per_name<$name> = $per_name([$(
            $name::$variant,
        )*]);

        impl<T> Index<$name> for $per_name<T> {
            type Output = T;

            fn index(&self, i: $name) -> &Self::Output {
                &self.0[i as usize]
            }
        }

        impl<T> IndexMut<$name> for $per_name<T> {
            fn index_mut(&mut self, i: $name) -> &mut Self::Output {
                &mut self.0[i as usize]
            }
        }

        impl<T> IntoIterator for $per_name<T> {
            type Item = T;
            type IntoIter = <[T; $num_constant] as IntoIterator>::IntoIter;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }
    };
}

// order of variants is the order faces are stored in block records
axis_enum!(
    Face,
    NUM_FACES = 5,
    PerFace,
    FACES,
    (
        W,
        E,
        N,
        S,
        Lid,
    ),
);

impl Face {
    pub fn is_side(self) -> bool {
        self != Face::Lid
    }
}

/// One of the 8 steps to a neighbouring block on the same layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MapDirection {
    N,
    E,
    S,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl MapDirection {
    /// Grid offset of one step in this direction. North is negative y.
    pub const fn to_vec(self) -> Vec2<i32> {
        let (x, y) = match self {
            MapDirection::N => (0, -1),
            MapDirection::E => (1, 0),
            MapDirection::S => (0, 1),
            MapDirection::W => (-1, 0),
            MapDirection::NE => (1, -1),
            MapDirection::NW => (-1, -1),
            MapDirection::SE => (1, 1),
            MapDirection::SW => (-1, 1),
        };
        Vec2 { x, y }
    }
}


#[test]
fn compass_offsets() {
    use MapDirection::*;

    assert_eq!(N.to_vec() + S.to_vec(), Vec2::zero());
    assert_eq!(E.to_vec() + W.to_vec(), Vec2::zero());
    assert_eq!(NE.to_vec(), N.to_vec() + E.to_vec());
    assert_eq!(NW.to_vec(), N.to_vec() + W.to_vec());
    assert_eq!(SE.to_vec(), S.to_vec() + E.to_vec());
    assert_eq!(SW.to_vec(), S.to_vec() + W.to_vec());
}

#[test]
fn per_face_indexing() {
    let mut faces = PerFace([0u8; NUM_FACES]);
    faces[Face::Lid] = 7;
    assert_eq!(faces.0, [0, 0, 0, 0, 7]);
    assert!(!Face::Lid.is_side());
    assert!(FACES.into_iter().filter(|face| face.is_side()).count() == 4);
}
