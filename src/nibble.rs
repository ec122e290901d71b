use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// A 4-bit unsigned integer (nibble).
///
/// Used for register indices and key indices, so it can index any 16-entry array
/// without a bounds check failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub struct u4(u8);

impl u4 {
    pub const MAX: u4 = u4(0x0F);

    /// Creates a new `u4` from a `u8`.
    ///
    /// Panics if the value is greater than 0x0F.
    pub const fn new(value: u8) -> Self {
        assert!(value <= 0x0F, "u4 value must be in range 0x0-0xF");
        Self(value)
    }

    /// Creates a new `u4` from the low four bits of a `u8`.
    pub const fn from_low_bits(value: u8) -> Self {
        Self(value & 0x0F)
    }

    /// Creates a new `u4`, or `None` if the value does not fit in four bits.
    pub const fn try_new(value: u8) -> Option<Self> {
        if value <= 0x0F { Some(Self(value)) } else { None }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u4> for usize {
    fn from(v: u4) -> usize {
        v.0 as usize
    }
}

impl From<u4> for u8 {
    fn from(v: u4) -> u8 {
        v.0
    }
}

impl fmt::Display for u4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl<T> Index<u4> for [T; 16] {
    type Output = T;

    fn index(&self, index: u4) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<u4> for [T; 16] {
    fn index_mut(&mut self, index: u4) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}
