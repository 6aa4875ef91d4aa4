// Task engine configuration.
//
// All tunable parameters live in `TaskConfig`, loadable from JSON — task
// code never uses magic numbers. Defaults match the classic agent
// constants: reach 3, attempts budget 3.
//
// See also: `task.rs` where the config rides along in `TaskContext`.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the task engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Maximum Manhattan distance at which a block can be placed.
    pub place_reach: u32,
    /// Maximum Manhattan distance at which a block can be dug.
    pub dig_reach: u32,
    /// Per-cell placement retry budget for Build.
    pub build_attempts: u8,
    /// Half-width of the spatial box Spawn searches for a new mob.
    pub mob_query_range: u32,
    /// How many ticks back Spawn's confirmation query looks.
    pub mob_spawn_window_ticks: u64,
    /// Node expansion budget for the grid A* pathfinder.
    pub astar_max_nodes: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            place_reach: 3,
            dig_reach: 3,
            build_attempts: 3,
            mob_query_range: 5,
            mob_spawn_window_ticks: 40,
            astar_max_nodes: 4096,
        }
    }
}

impl TaskConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
