pub mod alarm;
pub mod archetypes;
pub mod behaviors;
pub mod codec;
pub mod collision;
pub mod constants;
pub mod detection;
pub mod grid;
pub mod lobby;
pub mod movement;
pub mod protocol;
pub mod spawning;
