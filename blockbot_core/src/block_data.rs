// Block palette data: passability, build-time substitutions, diff exemptions.
//
// These tables drive the Build diff and the movement/pathfinding passability
// checks. Block ids follow the classic voxel-game numbering (0 air, 1 stone,
// 2 grass, 3 dirt, 8/9 water, ...).
//
// See also: `types.rs` for `Idm` and `MobKind`, and the Build task in
// `blockbot_tasks` which consumes the substitution map, ignore set, and
// interchangeable pairs.

use crate::types::{Idm, MobKind};

/// Block ids an agent's body can occupy (and walk through).
pub const PASSABLE_BLOCKS: &[u16] = &[
    0,   // air
    8,   // flowing water
    9,   // still water
    31,  // tall grass
    37,  // dandelion
    38,  // poppy
    175, // double plant
];

/// Block ids the Build diff never targets for correction: if the world holds
/// one of these where the schematic wants something else, leave it alone.
pub const BUILD_IGNORE_BLOCKS: &[u16] = &[
    8, // flowing water
    9, // still water
];

/// Block-type pairs the Build diff treats as equivalent: if the current and
/// schematic types fall on either side of a pair, the cell is not corrected.
pub const BUILD_INTERCHANGEABLE_PAIRS: &[(u16, u16)] = &[
    (2, 3), // grass / dirt
    (8, 9), // flowing / still water
];

/// Schematic block types that cannot be placed directly, mapped to a
/// placeable equivalent. Applied once at Build construction.
pub const BUILD_BLOCK_REPLACE_MAP: &[(u16, Idm)] = &[
    (7, Idm::new(1, 0)),   // bedrock -> stone
    (8, Idm::new(79, 0)),  // flowing water -> ice
    (9, Idm::new(79, 0)),  // still water -> ice
    (10, Idm::new(49, 0)), // flowing lava -> obsidian
    (11, Idm::new(49, 0)), // still lava -> obsidian
    (51, Idm::AIR),        // fire -> air
];

/// Ground-like block types. Build's ground-snap heuristic only fires when
/// the schematic actually contains one of these (a structure meant to sit
/// on terrain).
pub const GROUND_BLOCKS: &[u16] = &[2, 3];

/// Item id of the spawn egg. The egg's meta selects the mob kind.
pub const SPAWN_EGG_ID: u16 = 383;

/// Is this block id passable (the agent can stand in it)?
pub fn is_passable(id: u16) -> bool {
    PASSABLE_BLOCKS.contains(&id)
}

/// Look up the placement substitution for a schematic block type, if any.
pub fn build_replacement(id: u16) -> Option<Idm> {
    BUILD_BLOCK_REPLACE_MAP
        .iter()
        .find(|(bad, _)| *bad == id)
        .map(|(_, good)| *good)
}

/// Mob kind selected by a spawn egg's meta value.
pub fn mob_kind_for_meta(meta: u8) -> Option<MobKind> {
    match meta {
        90 => Some(MobKind::Pig),
        91 => Some(MobKind::Sheep),
        92 => Some(MobKind::Cow),
        93 => Some(MobKind::Chicken),
        101 => Some(MobKind::Rabbit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_passable() {
        assert!(is_passable(0));
        assert!(is_passable(9));
        assert!(!is_passable(1));
    }

    #[test]
    fn replacement_map_lookup() {
        assert_eq!(build_replacement(7), Some(Idm::new(1, 0)));
        assert_eq!(build_replacement(9), Some(Idm::new(79, 0)));
        assert_eq!(build_replacement(1), None);
    }

    #[test]
    fn spawn_egg_meta_selects_kind() {
        assert_eq!(mob_kind_for_meta(93), Some(MobKind::Chicken));
        assert_eq!(mob_kind_for_meta(92), Some(MobKind::Cow));
        assert_eq!(mob_kind_for_meta(0), None);
    }
}
