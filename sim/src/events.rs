//! Discrete gameplay events emitted by the session for the presentation/UI layer.

use wayfarer_shared::{Handle, NpcRecord, PickupRecord, PortalRecord, Vec3};

/// What the player is currently able to interact with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    Portal(Handle<PortalRecord>),
    Npc(Handle<NpcRecord>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PickupCollected(Handle<PickupRecord>),
    /// `None` means focus was lost.
    FocusChanged(Option<FocusTarget>),
    RespawnAll,
    FellOutOfWorld,
    Interacted(Handle<NpcRecord>),
    Teleported { to: Vec3 },
}
