/*!
Tolerances and hard caps shared by the load pipeline and the controller.

Tunable gameplay numbers live on the config structs (`config`, `physics::settings`); what remains
here are values that are not meant to be tuned per level.

Notes
- Distances are in meters, time in seconds.
- Favor practical world-space tolerances over machine epsilon.
*/

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;

/// Triangles with a smaller doubled area are dropped before building a trimesh (m^2).
pub const MIN_TRIANGLE_AREA2: f32 = 1.0e-10;

/// Upper bound on instances expanded from a single instanced mesh.
pub const MAX_INSTANCE_EXPANSION: usize = 320;

/// Fixed simulation rate used by the default tick configuration.
pub const FIXED_TICK_HZ: u32 = 60;

/// Longest frame delta accepted by the fixed-step clock (seconds).
/// Larger hitches are clamped to avoid a spiral of catch-up ticks.
pub const MAX_FRAME_DT_S: f32 = 0.25;

/// Maximum number of fixed ticks executed for one frame.
pub const MAX_STEPS_PER_FRAME: u32 = 5;

/// Number of cardinal destination anchors.
pub const DESTINATION_COUNT: usize = 4;
