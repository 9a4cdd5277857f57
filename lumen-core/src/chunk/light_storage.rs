//! Light storage for 16x16x16 chunk sections.
//!
//! Light values are 4-bit (0-15), packed two per byte, so a full section takes
//! 2048 bytes. Uniform sections keep a single value until a differing one is written.

/// The number of bytes needed to store one section of packed light.
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// Light of one section, one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightStorage {
    /// Every voxel has the same level.
    Homogeneous(u8),
    /// Packed nibbles, index `y * 256 + z * 16 + x`, even indices in the low nibble.
    Heterogeneous(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

#[inline]
const fn nibble_slot(x: usize, y: usize, z: usize) -> (usize, u32) {
    let index = y * 256 + z * 16 + x;
    (index >> 1, ((index & 1) as u32) * 4)
}

impl LightStorage {
    /// A section where every voxel has `level`.
    #[must_use]
    pub fn new_filled(level: u8) -> Self {
        Self::Homogeneous(level & 0x0F)
    }

    /// A dark section.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::Homogeneous(0)
    }

    /// Whether every voxel is dark.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        match self {
            Self::Homogeneous(level) => *level == 0,
            Self::Heterogeneous(data) => data.iter().all(|&byte| byte == 0),
        }
    }

    /// Gets the level at local section coordinates, each `0..16`.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        match self {
            Self::Homogeneous(level) => *level,
            Self::Heterogeneous(data) => {
                let (byte, shift) = nibble_slot(x, y, z);
                (data[byte] >> shift) & 0x0F
            }
        }
    }

    /// Sets the level at local section coordinates and returns whether it changed.
    ///
    /// Values are masked to 4 bits.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, level: u8) -> bool {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        let level = level & 0x0F;
        if self.get(x, y, z) == level {
            return false;
        }

        if let Self::Homogeneous(current) = *self {
            *self = Self::Heterogeneous(Box::new([current | (current << 4); LIGHT_ARRAY_SIZE]));
        }

        if let Self::Heterogeneous(data) = self {
            let (byte, shift) = nibble_slot(x, y, z);
            data[byte] = (data[byte] & !(0x0F << shift)) | (level << shift);
        }
        true
    }
}

impl Default for LightStorage {
    fn default() -> Self {
        Self::new_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_get() {
        let storage = LightStorage::new_filled(15);
        assert_eq!(storage.get(0, 0, 0), 15);
        assert_eq!(storage.get(15, 15, 15), 15);
        assert!(!storage.is_dark());
    }

    #[test]
    fn set_upgrades_to_heterogeneous() {
        let mut storage = LightStorage::new_empty();
        assert!(storage.set(5, 5, 5, 14));

        assert_eq!(storage.get(5, 5, 5), 14);
        assert_eq!(storage.get(0, 0, 0), 0);
        assert!(matches!(storage, LightStorage::Heterogeneous(_)));
    }

    #[test]
    fn writing_the_same_value_keeps_the_section_uniform() {
        let mut storage = LightStorage::new_filled(7);
        assert!(!storage.set(3, 4, 5, 7));
        assert_eq!(storage, LightStorage::Homogeneous(7));
    }

    #[test]
    fn upgrade_preserves_the_previous_level() {
        let mut storage = LightStorage::new_filled(9);
        storage.set(0, 0, 0, 2);
        assert_eq!(storage.get(0, 0, 0), 2);
        assert_eq!(storage.get(1, 0, 0), 9);
        assert_eq!(storage.get(15, 15, 15), 9);
    }

    #[test]
    fn adjacent_voxels_share_a_byte() {
        let mut storage = LightStorage::new_empty();
        storage.set(0, 0, 0, 5);
        storage.set(1, 0, 0, 10);

        assert_eq!(storage.get(0, 0, 0), 5);
        assert_eq!(storage.get(1, 0, 0), 10);

        storage.set(0, 0, 0, 0);
        storage.set(1, 0, 0, 0);
        assert!(storage.is_dark());
    }

    #[test]
    fn values_are_masked_to_four_bits() {
        let mut storage = LightStorage::new_empty();
        storage.set(2, 2, 2, 0x1F);
        assert_eq!(storage.get(2, 2, 2), 15);
        assert_eq!(storage.get(3, 2, 2), 0);
    }
}
