pub mod collision;
pub mod enemies;
pub mod network;
pub mod players;

pub use collision::{apply_enemy_contacts, players_rescue_system};
pub use enemies::{AiContext, AiReport, enemies_ai_system, enemies_cleanup_system, update_enemies};
pub use network::{enemies_update, players_update, process_disconnect, process_guest_message};
pub use players::players_movement_system;
