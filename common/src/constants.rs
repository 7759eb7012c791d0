// ============================================================================
// Floating-Point Comparisons
// ============================================================================

// Small value for floating-point comparisons (near-zero checks, division guards).
pub const PHYSICS_EPSILON: f32 = 1e-6;

// ============================================================================
// Grid & World
// ============================================================================

pub const GRID_SIZE: f32 = 64.0; // Each grid cell size in world units
pub const MAP_BLOCKS: i32 = 16; // Cells per side (square map)
pub const WORLD_SIZE: f32 = GRID_SIZE * MAP_BLOCKS as f32; // 1024 world units
pub const CENTER_POS: f32 = (MAP_BLOCKS / 2) as f32 * GRID_SIZE + GRID_SIZE / 2.0;

pub const WORLD_MARGIN: f32 = 32.0; // Players are clamped this far from the edges
pub const MIN_SPAWN_MARGIN: i32 = 2; // cells

// ============================================================================
// Player
// ============================================================================

pub const PLAYER_SPEED_BLOCKS_PER_SEC: f32 = 3.5;
pub const PLAYER_BASE_SPEED: f32 = GRID_SIZE * PLAYER_SPEED_BLOCKS_PER_SEC;

pub const HOST_COLOR: &str = "#6366f1";
pub const PLAYER_COLORS: [&str; 7] = [
    "#10b981", "#f59e0b", "#ef4444", "#ec4899", "#8b5cf6", "#06b6d4", "#f97316",
];

// Local prediction adopts the authoritative position when they drift this far apart
pub const RECONCILE_SNAP_DISTANCE: f32 = 100.0;

// Remote players approach their last known position with factor 1 - exp(-RATE * dt)
pub const REMOTE_SMOOTHING_RATE: f32 = 15.0;

// Minimum time between two PLAYER_MOVE echoes
pub const PLAYER_MOVE_INTERVAL: f32 = 0.033; // seconds

// ============================================================================
// Enemies
// ============================================================================

// Speeds (cells per second, scaled by GRID_SIZE in the archetype table)
pub const GUARD_PATROL_SPEED: f32 = 1.5;
pub const GUARD_CHASE_SPEED: f32 = 2.5;
pub const DOG_PATROL_SPEED: f32 = 2.0;
pub const DOG_CHASE_SPEED: f32 = 3.5;
pub const DRONE_PATROL_SPEED: f32 = 2.5;
pub const DRONE_CHASE_SPEED: f32 = 2.5;

// Responders hurry to an alarm at this multiple of the player speed
pub const INVESTIGATE_SPEED_FACTOR: f32 = 1.5;

// Detection ranges (cells)
pub const GUARD_DETECTION_RANGE: f32 = 2.0;
pub const DOG_DETECTION_RANGE: f32 = 5.0;
pub const DRONE_DETECTION_RANGE: f32 = 2.0;
pub const CAMERA_DETECTION_RANGE: f32 = 2.0;

// Cameras only see along their row
pub const CAMERA_ROW_THRESHOLD: f32 = GRID_SIZE * 0.5;

// Leash distances (cells)
pub const DRONE_LEASH: f32 = 1.0;
pub const GROUND_LEASH: f32 = 8.0;

// Investigation dwell (seconds)
pub const INVESTIGATION_DURATION: f32 = 8.0;
pub const SENSOR_DWELL_DURATION: f32 = 1.0;

// Arrival thresholds (world units)
pub const PATROL_WAYPOINT_THRESHOLD: f32 = 5.0;
pub const INVESTIGATE_ARRIVAL_THRESHOLD: f32 = 10.0;
pub const RETURN_ARRIVAL_THRESHOLD: f32 = 5.0;

// ============================================================================
// Collision
// ============================================================================

// Contact distance; smaller than the sprite size so captures feel fair
pub const COLLISION_DISTANCE: f32 = 40.0;

// ============================================================================
// Fixed Layout
// ============================================================================

pub const DOOR_CELLS: [(i32, i32); 4] = [(1, 1), (14, 1), (1, 14), (14, 14)];
pub const CAMERA_CELLS: [(i32, i32); 3] = [(4, 4), (11, 8), (4, 11)];

// ============================================================================
// Lobby
// ============================================================================

pub const MAX_LOBBY_PLAYERS: usize = 10;
