/*!
Classification rule table.

Rules are evaluated top to bottom; the first rule with a final outcome decides the role.
Marker rules (ladder, NPC) record a side-table entry and let evaluation continue, so a ladder
mesh still ends up solid.

Order
1. water            -> Water
2. ladder           (marker)
3. npc              (marker)
4. walkable         -> Walkable
5. pickup           -> Pickup
6. gate screen      -> Excluded(GateScreen)
7. gate             -> GateFrame
8. backdrop         -> Excluded(Backdrop)
9. prop             -> Prop
otherwise           -> Excluded(Negligible)
*/

use super::{ExclusionReason, MeshRole};
use crate::{
    config::ClassifierConfig,
    flags::{NodeFlag, NodeFlags},
    metrics::MeshMetrics,
    scene::Material,
    vocabulary::{Lexicon, Vocabulary},
};

/// Everything a predicate may look at.
pub struct RuleInput<'a> {
    /// Name tokens followed by material tokens.
    pub tokens: &'a [String],
    /// Tokens of the leaf name alone.
    pub name_tokens: &'a [String],
    pub metrics: &'a MeshMetrics,
    pub material: &'a Material,
    pub flags: NodeFlags,
    pub vocabulary: &'a Vocabulary,
    pub config: &'a ClassifierConfig,
}

impl RuleInput<'_> {
    #[inline]
    fn has(&self, lexicon: Lexicon) -> bool {
        self.vocabulary.matches(lexicon, self.tokens)
    }

    #[inline]
    fn name_has(&self, lexicon: Lexicon) -> bool {
        self.vocabulary.matches(lexicon, self.name_tokens)
    }

    /// Structural, NPC or ladder words keep a mesh out of the pickup and walkable fallbacks.
    #[inline]
    fn is_structural(&self) -> bool {
        self.has(Lexicon::Structural) || self.has(Lexicon::Npc)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    Ladder,
    Npc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Role(MeshRole),
    Mark(Marker),
}

pub struct Rule {
    pub name: &'static str,
    pub test: fn(&RuleInput) -> bool,
    pub outcome: Outcome,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "water",
        test: is_water,
        outcome: Outcome::Role(MeshRole::Water),
    },
    Rule {
        name: "ladder",
        test: is_ladder,
        outcome: Outcome::Mark(Marker::Ladder),
    },
    Rule {
        name: "npc",
        test: is_npc,
        outcome: Outcome::Mark(Marker::Npc),
    },
    Rule {
        name: "walkable",
        test: is_walkable,
        outcome: Outcome::Role(MeshRole::Walkable),
    },
    Rule {
        name: "pickup",
        test: is_pickup,
        outcome: Outcome::Role(MeshRole::Pickup),
    },
    Rule {
        name: "gate-screen",
        test: is_gate_screen,
        outcome: Outcome::Role(MeshRole::Excluded(ExclusionReason::GateScreen)),
    },
    Rule {
        name: "gate",
        test: is_gate,
        outcome: Outcome::Role(MeshRole::GateFrame),
    },
    Rule {
        name: "backdrop",
        test: is_backdrop,
        outcome: Outcome::Role(MeshRole::Excluded(ExclusionReason::Backdrop)),
    },
    Rule {
        name: "prop",
        test: is_prop,
        outcome: Outcome::Role(MeshRole::Prop),
    },
];

/// Result of running the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub role: MeshRole,
    pub rule: &'static str,
    pub markers: Vec<Marker>,
}

pub fn evaluate(input: &RuleInput) -> Verdict {
    let mut markers = Vec::new();
    for rule in RULES {
        if !(rule.test)(input) {
            continue;
        }
        match rule.outcome {
            Outcome::Mark(marker) => markers.push(marker),
            Outcome::Role(role) => {
                return Verdict {
                    role,
                    rule: rule.name,
                    markers,
                };
            }
        }
    }

    Verdict {
        role: MeshRole::Excluded(ExclusionReason::Negligible),
        rule: "negligible",
        markers,
    }
}

pub fn is_water(i: &RuleInput) -> bool {
    i.has(Lexicon::Water)
        && i.metrics.footprint_area >= i.config.water_min_area
        && i.metrics.thickness <= i.config.water_max_thickness
}

pub fn is_ladder(i: &RuleInput) -> bool {
    let c = i.config;
    i.name_has(Lexicon::Climb)
        && (c.ladder_min_height..=c.ladder_max_height).contains(&i.metrics.thickness)
        && i.metrics.max_horizontal() < c.ladder_max_horizontal
}

pub fn is_npc(i: &RuleInput) -> bool {
    i.has(Lexicon::Npc)
}

pub fn is_walkable(i: &RuleInput) -> bool {
    if i.has(Lexicon::Ground) {
        return true;
    }

    let (m, c) = (i.metrics, i.config);
    !i.is_structural()
        && m.thickness > c.walkable_min_thickness
        && m.thickness < c.walkable_max_thickness
        && m.footprint_area > c.walkable_min_area
        && (m.aspect > c.walkable_min_aspect || m.footprint_area > c.walkable_broad_area)
}

pub fn is_pickup(i: &RuleInput) -> bool {
    let (m, c) = (i.metrics, i.config);
    if i.is_structural() || m.max_dim < c.pickup_min_dim {
        return false;
    }

    if i.has(Lexicon::Pickup) {
        let max_area = if i.has(Lexicon::CoinLike) {
            c.coin_max_area
        } else {
            c.pickup_max_area
        };
        return m.max_dim <= c.pickup_max_dim
            && m.volume <= c.pickup_max_volume
            && m.footprint_area <= max_area;
    }

    // Unnamed small props.
    !i.has(Lexicon::Screen)
        && !i.has(Lexicon::Background)
        && m.max_dim <= c.fallback_pickup_max_dim
        && m.volume <= c.fallback_pickup_max_volume
        && m.footprint_area <= c.fallback_pickup_max_area
}

/// See-through sub-surface: transparent material, screen vocabulary or a thin panel.
pub fn is_screen(i: &RuleInput) -> bool {
    let m = i.metrics;
    let transparent = i.material.transparent
        || i.material.opacity < 1.0
        || i.flags.has(NodeFlag::Transparent);

    let thin_panel = {
        let mut dims = [m.size.x, m.size.y, m.size.z];
        dims.sort_by(f32::total_cmp);
        dims[0] <= i.config.screen_max_thickness
            && dims[1] >= dims[0] * i.config.screen_panel_ratio
            && dims[1] > 0.0
    };

    transparent || i.has(Lexicon::Screen) || thin_panel
}

pub fn is_gate_screen(i: &RuleInput) -> bool {
    i.has(Lexicon::Gate) && is_screen(i)
}

pub fn is_gate(i: &RuleInput) -> bool {
    i.has(Lexicon::Gate)
}

pub fn is_backdrop(i: &RuleInput) -> bool {
    i.has(Lexicon::Background)
        && (i.metrics.max_dim >= i.config.backdrop_min_size
            || i.metrics.volume >= i.config.backdrop_min_volume)
}

pub fn is_prop(i: &RuleInput) -> bool {
    i.metrics.volume >= i.config.prop_min_volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::Point3,
        vocabulary::{tokenize, tokenize_mesh},
    };
    use rapier3d::parry::bounding_volume::Aabb;

    fn verdict(name: &str, material: Material, size: [f32; 3]) -> Verdict {
        let metrics = MeshMetrics::from_aabb(&Aabb::new(Point3::origin(), Point3::from(size)));
        let tokens = tokenize_mesh(name, &material.name);
        let name_tokens = tokenize(name);
        let vocabulary = Vocabulary::default();
        let config = ClassifierConfig::default();
        evaluate(&RuleInput {
            tokens: &tokens,
            name_tokens: &name_tokens,
            metrics: &metrics,
            material: &material,
            flags: NodeFlags::default(),
            vocabulary: &vocabulary,
            config: &config,
        })
    }

    fn role(name: &str, size: [f32; 3]) -> MeshRole {
        verdict(name, Material::named("standard"), size).role
    }

    #[test]
    fn water_beats_pickup_vocabulary() {
        assert_eq!(role("RiverCoin", [12.0, 0.05, 4.0]), MeshRole::Water);
    }

    #[test]
    fn thick_water_is_not_water() {
        assert_ne!(role("Lake", [12.0, 2.0, 4.0]), MeshRole::Water);
    }

    #[test]
    fn walkable_shape_beats_pickup_keyword() {
        // Broad, thin slabs that happen to carry a collectible word.
        assert_eq!(role("RampBox", [5.0, 0.5, 3.0]), MeshRole::Walkable);
        assert_eq!(role("BigBox", [5.0, 0.5, 3.0]), MeshRole::Walkable);
        assert_eq!(role("StarSlab", [8.0, 0.4, 8.0]), MeshRole::Walkable);
        // Too small for the walkable shape: the keyword decides.
        assert_eq!(role("SmallBox", [1.0, 1.0, 1.0]), MeshRole::Pickup);
    }

    #[test]
    fn bridge_is_walkable() {
        assert_eq!(role("Bridge_02", [10.0, 0.4, 3.0]), MeshRole::Walkable);
    }

    #[test]
    fn unnamed_broad_slab_falls_back_to_walkable() {
        assert_eq!(role("Object_12", [6.0, 0.5, 4.0]), MeshRole::Walkable);
        // Square and small: aspect test fails and area is below the broad threshold.
        assert_ne!(role("Object_13", [3.0, 0.5, 3.0]), MeshRole::Walkable);
    }

    #[test]
    fn coin_is_pickup() {
        assert_eq!(role("Coin_07", [0.4, 0.4, 0.4]), MeshRole::Pickup);
    }

    #[test]
    fn coin_like_names_allow_wider_footprints() {
        // Thinner than any walkable, so only the footprint caps apply.
        assert_eq!(role("GiantRing", [6.0, 0.1, 6.0]), MeshRole::Pickup);
        assert_ne!(role("GiantGem", [6.0, 0.1, 6.0]), MeshRole::Pickup);
    }

    #[test]
    fn structural_words_block_pickup() {
        assert_eq!(role("SignBox", [1.0, 1.0, 1.0]), MeshRole::Prop);
        assert_eq!(role("Tree_small", [1.0, 2.0, 1.0]), MeshRole::Prop);
    }

    #[test]
    fn small_unnamed_prop_is_fallback_pickup() {
        assert_eq!(role("Object_99", [0.6, 0.6, 0.6]), MeshRole::Pickup);
    }

    #[test]
    fn ladder_marks_and_continues_to_prop() {
        let v = verdict("Ladder_A", Material::named("wood"), [0.8, 5.0, 0.2]);
        assert_eq!(v.markers, vec![Marker::Ladder]);
        assert_eq!(v.role, MeshRole::Prop);
    }

    #[test]
    fn climb_material_alone_is_not_a_ladder() {
        let v = verdict("Pole_03", Material::named("rope"), [0.8, 5.0, 0.2]);
        assert!(v.markers.is_empty());
        assert_eq!(v.role, MeshRole::Prop);
    }

    #[test]
    fn gate_screen_detected_by_material_and_panel_shape() {
        let glass = verdict("Gate_01_Fill", Material::translucent("glow", 0.5), [3.0, 3.0, 0.5]);
        assert_eq!(glass.role, MeshRole::Excluded(ExclusionReason::GateScreen));

        let panel = role("Gate_01_Fill", [3.0, 3.0, 0.05]);
        assert_eq!(panel, MeshRole::Excluded(ExclusionReason::GateScreen));

        let frame = role("Gate_01_Frame", [4.0, 4.0, 0.5]);
        assert_eq!(frame, MeshRole::GateFrame);
    }

    #[test]
    fn giant_background_is_excluded() {
        assert_eq!(
            role("Skydome", [400.0, 200.0, 400.0]),
            MeshRole::Excluded(ExclusionReason::Backdrop)
        );
        assert_eq!(role("Mountain_small", [4.0, 5.0, 4.0]), MeshRole::Prop);
    }

    #[test]
    fn tiny_volume_is_negligible() {
        assert_eq!(
            role("Wall_trim", [3.0, 0.05, 0.05]),
            MeshRole::Excluded(ExclusionReason::Negligible)
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let a = verdict("GateArch", Material::named("stone"), [5.0, 4.0, 0.6]);
        let b = verdict("GateArch", Material::named("stone"), [5.0, 4.0, 0.6]);
        assert_eq!(a, b);
        assert_eq!(a.rule, "gate");
    }
}
