// ============================================================================
// Host Loop
// ============================================================================

pub const HOST_LOOP_FREQUENCY: u64 = 60; // Hz

// Longer frames are simulated as this long so a stall cannot teleport enemies
pub const MAX_FRAME_DELTA: f32 = 0.1; // seconds

// ============================================================================
// Enemy Replication
// ============================================================================

// ENEMY_MOVE is sent at most this often per enemy unless something important changed
pub const ENEMY_SYNC_INTERVAL: f32 = 0.033; // seconds

// A sensor raises at most one alarm per cooldown
pub const ALARM_COOLDOWN: f32 = 1.0; // seconds

// ============================================================================
// Logging
// ============================================================================

pub const DEFAULT_LOG_FILTER: &str = "info";
