//! Small hand-built level: a central plaza, four corner islands, a ladder tower, a gate with a
//! portal screen, coins, an instanced gem cluster and an NPC.
//!
//! North is -Z. Every walkable top sits at y = 0 except the tower ledge (y = 6).

use wayfarer_shared::{
    Mat4, Material, MeshData, NodeFlag, SceneGraph, SceneNode, Transform, Vec3,
};

/// Where the named pieces of [`demo_scene`] sit, for callers that script a walk through it.
pub mod layout {
    use wayfarer_shared::Vec3;

    pub const PLAZA_HALF: f32 = 15.0;
    pub const COIN_Z: f32 = -4.0;
    pub const COIN_XS: [f32; 5] = [-4.0, -2.0, 0.0, 2.0, 4.0];
    pub const COIN_Y: f32 = 1.0;
    pub const GEM_POSITIONS: [[f32; 3]; 3] = [[-6.0, 1.0, -6.0], [-6.0, 1.0, -7.0], [-6.0, 1.0, -8.0]];
    pub const GATE_Z: f32 = -12.0;
    pub const LADDER_Z: f32 = 6.85;
    pub const LADDER_TOP: f32 = 6.0;
    pub const LEDGE_TOP: f32 = 6.0;
    pub const ISLAND_OFFSET: f32 = 40.0;

    pub fn npc_base() -> Vec3 {
        Vec3::new(8.0, 0.0, -8.0)
    }
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, y, z))
}

fn block(name: &str, size: [f32; 3], material: &str, place: Transform) -> SceneNode {
    SceneNode::mesh(name, MeshData::cuboid(size, Material::named(material))).with_transform(place)
}

pub fn demo_scene() -> SceneGraph {
    use layout::*;

    let ground = SceneNode::group("Ground").with_children([
        block("Plaza_Hub", [30.0, 0.5, 30.0], "stone", at(0.0, -0.25, 0.0)),
        block("Bridge_02", [10.0, 0.4, 3.0], "wood", at(20.0, -0.2, 0.0)),
        block("Ice_Path", [8.0, 0.3, 2.0], "frost", at(-20.0, -0.15, -20.0)),
        block("Island_NE", [14.0, 0.5, 14.0], "grass", at(ISLAND_OFFSET, -0.25, -ISLAND_OFFSET)),
        block("Island_NW", [14.0, 0.5, 14.0], "grass", at(-ISLAND_OFFSET, -0.25, -ISLAND_OFFSET)),
        block("Island_SE", [14.0, 0.5, 14.0], "grass", at(ISLAND_OFFSET, -0.25, ISLAND_OFFSET)),
        block("Island_SW", [14.0, 0.5, 14.0], "grass", at(-ISLAND_OFFSET, -0.25, ISLAND_OFFSET)),
    ]);

    let tower = SceneNode::group("Tower").with_children([
        block("Tower_Base", [6.0, 5.5, 6.0], "brick", at(0.0, 2.75, 10.0)),
        block("Ledge_Platform", [6.0, 0.5, 6.0], "brick", at(0.0, LEDGE_TOP - 0.25, 10.0)),
        block("Ladder_Tower", [0.8, LADDER_TOP, 0.3], "wood", at(0.0, LADDER_TOP * 0.5, LADDER_Z)),
    ]);

    let gate = SceneNode::group("NorthGate")
        .with_transform(at(0.0, 0.0, GATE_Z))
        .with_children([
            block("Gate_North_Frame", [4.0, 4.0, 0.6], "stone", at(0.0, 2.0, 0.0)),
            SceneNode::mesh(
                "Gate_North_Screen",
                MeshData::cuboid([2.8, 3.6, 0.05], Material::translucent("energy", 0.5)),
            )
            .with_transform(at(0.0, 1.8, 0.0)),
        ]);

    let coins = SceneNode::group("Coins").with_children(COIN_XS.iter().enumerate().map(|(i, x)| {
        block(
            &format!("Coin_{:02}", i + 1),
            [0.4, 0.4, 0.4],
            "gold",
            at(*x, COIN_Y, COIN_Z),
        )
    }));

    let gems = SceneNode::instanced(
        "GemCluster",
        MeshData::cuboid([0.5, 0.5, 0.5], Material::named("amethyst")),
        GEM_POSITIONS
            .iter()
            .map(|p| Mat4::new_translation(&Vec3::from(*p)))
            .collect(),
    );

    let pillars = SceneNode::instanced(
        "Stone_Pillar",
        MeshData::cuboid([1.0, 3.0, 1.0], Material::named("stone")),
        [[12.0, 1.5, 12.0], [-12.0, 1.5, 12.0], [12.0, 1.5, -12.0]]
            .iter()
            .map(|p| Mat4::new_translation(&Vec3::from(*p)))
            .collect(),
    );

    let npc = SceneNode::mesh(
        "Villager_Guide",
        MeshData::cuboid([0.6, 1.8, 0.6], Material::named("cloth")),
    )
    .with_transform(Transform::from_translation(layout::npc_base() + Vec3::y() * 0.9));

    let scenery = SceneNode::group("Scenery").with_children([
        block("Stone_Wall", [10.0, 3.0, 0.5], "stone", at(-10.0, 1.5, 6.0)),
        block("Lake_Surface", [20.0, 0.05, 20.0], "water", at(0.0, -2.0, 30.0)),
        block("Skydome", [400.0, 200.0, 400.0], "sky", at(0.0, 0.0, 0.0)),
        block("Debug_Marker", [1.0, 1.0, 1.0], "debug", at(3.0, 0.5, 3.0)).with_flag(NodeFlag::Hidden),
        SceneNode::mesh(
            "Broken_Import",
            MeshData {
                positions: None,
                indices: None,
                material: Material::named("missing"),
            },
        ),
    ]);

    SceneGraph::new(vec![ground, tower, gate, coins, gems, pillars, npc, scenery])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_shared::{ExclusionReason, MeshClassifier, MeshRole};

    #[test]
    fn demo_roles_are_as_authored() {
        let classification = MeshClassifier::default().classify(&demo_scene());
        let role = |name: &str| {
            classification
                .meshes
                .iter()
                .find(|m| m.name == name)
                .map(|m| m.role)
        };

        assert_eq!(role("Plaza_Hub"), Some(MeshRole::Walkable));
        assert_eq!(role("Bridge_02"), Some(MeshRole::Walkable));
        assert_eq!(role("Ledge_Platform"), Some(MeshRole::Walkable));
        assert_eq!(role("Tower_Base"), Some(MeshRole::Prop));
        assert_eq!(role("Ladder_Tower"), Some(MeshRole::Prop));
        assert_eq!(role("Gate_North_Frame"), Some(MeshRole::GateFrame));
        assert_eq!(
            role("Gate_North_Screen"),
            Some(MeshRole::Excluded(ExclusionReason::GateScreen))
        );
        assert_eq!(role("Coin_01"), Some(MeshRole::Pickup));
        assert_eq!(role("GemCluster"), Some(MeshRole::Pickup));
        assert_eq!(role("Stone_Pillar"), Some(MeshRole::Prop));
        assert_eq!(role("Villager_Guide"), Some(MeshRole::Prop));
        assert_eq!(role("Stone_Wall"), Some(MeshRole::Prop));
        assert_eq!(role("Lake_Surface"), Some(MeshRole::Water));
        assert_eq!(
            role("Skydome"),
            Some(MeshRole::Excluded(ExclusionReason::Backdrop))
        );
        assert_eq!(role("Debug_Marker"), None);
        assert_eq!(role("Broken_Import"), None);
        assert_eq!(classification.skipped, 2);
    }

    #[test]
    fn demo_registries_are_populated() {
        let regs = MeshClassifier::default().classify(&demo_scene()).registries;
        assert_eq!(regs.pickups.len(), layout::COIN_XS.len() + layout::GEM_POSITIONS.len());
        assert_eq!(regs.ladders.len(), 1);
        assert_eq!(regs.portals.len(), 1);
        assert_eq!(regs.npcs.len(), 1);
    }
}
