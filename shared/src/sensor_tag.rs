/*!
Sensor tags packed into collider user data.

Rapier gives every collider a single `u128` of user data. Sensors carry a `(kind, id)` pair in it
so overlap queries can be mapped back to registry entries without a side lookup.

Bit layout (least-significant bit = bit 0):
- bits 0..=31   : registry index (u32)
- bits 32..=39  : [`SensorKind`] tag (u8)
- bits 40..=127 : reserved, zero

Solid colliders keep user data `0`, which never decodes to a valid tag because kind `0` is unused.
*/

/// Discriminator for the registry a sensor refers to.
///
/// The numeric values are part of the packed format. Do not reorder.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Pickup = 1,
    Portal = 2,
    Npc = 3,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SensorTag {
    pub kind: SensorKind,
    pub id: u32,
}

impl SensorTag {
    pub const fn new(kind: SensorKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn pickup(id: u32) -> Self {
        Self::new(SensorKind::Pickup, id)
    }

    pub const fn portal(id: u32) -> Self {
        Self::new(SensorKind::Portal, id)
    }

    pub const fn npc(id: u32) -> Self {
        Self::new(SensorKind::Npc, id)
    }

    pub fn pack(self) -> u128 {
        (self.id as u128) | ((self.kind as u128) << u32::BITS)
    }

    /// Returns `None` for untagged (solid) colliders, unknown kinds or non-zero reserved bits.
    pub fn try_unpack(data: u128) -> Option<Self> {
        const RESERVED_MASK: u128 = !0u128 << 40;
        if data & RESERVED_MASK != 0 {
            return None;
        }

        let kind = match ((data >> u32::BITS) & u8::MAX as u128) as u8 {
            1 => SensorKind::Pickup,
            2 => SensorKind::Portal,
            3 => SensorKind::Npc,
            _ => return None,
        };

        Some(Self {
            kind,
            id: (data & u32::MAX as u128) as u32,
        })
    }
}

/// Packs a [`SensorTag`] into collider user data.
pub fn pack_tag(tag: SensorTag) -> u128 {
    tag.pack()
}

/// Safely extracts a [`SensorTag`] from collider user data.
pub fn try_unpack_tag(data: u128) -> Option<SensorTag> {
    SensorTag::try_unpack(data)
}
