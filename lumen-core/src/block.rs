//! Light-relevant block properties and the two light channels.

use bitflags::bitflags;

/// The maximum light level of either channel.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// Everything the light engine needs to know about a block.
///
/// The engine never stores these itself; they are read from the world on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockProperties {
    /// Caller-defined block id, only used for identification.
    pub id: u16,
    /// Opaque blocks stop light entirely.
    pub is_opaque: bool,
    /// Whether the block emits block light.
    pub is_light_source: bool,
    /// Emitted block light, `0..=15`.
    pub light_emission: u8,
    /// Light lost when passing through this block. `0` means the default loss of one level.
    pub filter_light: u8,
}

impl BlockProperties {
    /// A transparent block without any special behaviour.
    pub const AIR: Self = Self::transparent(0);

    /// Stand-in for voxels the world has no data for: opaque, emits nothing.
    pub const MISSING: Self = Self::opaque(u16::MAX);

    /// A fully transparent block.
    #[must_use]
    pub const fn transparent(id: u16) -> Self {
        Self {
            id,
            is_opaque: false,
            is_light_source: false,
            light_emission: 0,
            filter_light: 0,
        }
    }

    /// An opaque block.
    #[must_use]
    pub const fn opaque(id: u16) -> Self {
        Self {
            id,
            is_opaque: true,
            is_light_source: false,
            light_emission: 0,
            filter_light: 0,
        }
    }

    /// Makes the block emit `level` block light. Levels above 15 are clamped.
    #[must_use]
    pub const fn emitting(mut self, level: u8) -> Self {
        let level = if level > MAX_LIGHT_LEVEL {
            MAX_LIGHT_LEVEL
        } else {
            level
        };
        self.light_emission = level;
        self.is_light_source = level > 0;
        self
    }

    /// Makes light passing through the block lose `filter` levels instead of one.
    #[must_use]
    pub const fn filtering(mut self, filter: u8) -> Self {
        self.filter_light = if filter > MAX_LIGHT_LEVEL {
            MAX_LIGHT_LEVEL
        } else {
            filter
        };
        self
    }

    /// The block light this block seeds into its own voxel.
    #[must_use]
    pub const fn emission(&self) -> u8 {
        if self.is_light_source {
            self.light_emission
        } else {
            0
        }
    }

    /// The level light arriving at `level` has after entering this block.
    #[must_use]
    pub const fn attenuate(&self, level: u8) -> u8 {
        if self.is_opaque {
            0
        } else if self.filter_light > 0 {
            level.saturating_sub(self.filter_light)
        } else {
            level.saturating_sub(1)
        }
    }
}

/// One of the two independent light fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightChannel {
    /// Light emitted by blocks.
    Block,
    /// Light coming from the open sky.
    Sky,
}

impl LightChannel {
    /// Both channels in processing order.
    pub const ALL: [LightChannel; 2] = [LightChannel::Block, LightChannel::Sky];

    /// The channel as a single-member set.
    #[must_use]
    pub const fn as_set(self) -> LightChannels {
        match self {
            Self::Block => LightChannels::BLOCK,
            Self::Sky => LightChannels::SKY,
        }
    }
}

bitflags! {
    /// A set of light channels a column update should recompute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LightChannels: u8 {
        /// Block light.
        const BLOCK = 1 << 0;
        /// Sky light.
        const SKY = 1 << 1;
        /// Both channels.
        const BOTH = Self::BLOCK.bits() | Self::SKY.bits();
    }
}

impl LightChannels {
    /// Whether the set contains `channel`.
    #[must_use]
    pub const fn includes(self, channel: LightChannel) -> bool {
        self.contains(channel.as_set())
    }

    /// The channels that need recomputing after `old` was replaced by `new`.
    ///
    /// Returns an empty set when the swap cannot change any light value.
    #[must_use]
    pub fn for_change(old: &BlockProperties, new: &BlockProperties) -> Self {
        if old.is_opaque != new.is_opaque || old.filter_light != new.filter_light {
            Self::BOTH
        } else if old.emission() != new.emission() {
            Self::BLOCK
        } else {
            Self::empty()
        }
    }
}
