// Per-state movement rules. Every behavior is a pure function of the enemy
// (plus whatever it looks at) and returns a step value; the AI coordinator
// decides how to apply it.

pub mod chase;
pub mod investigate;
pub mod patrol;
pub mod returning;

pub use chase::{ChaseStep, chase_step};
pub use investigate::{InvestigateOutcome, InvestigateStep, investigate_step};
pub use patrol::{PatrolStep, patrol_step};
pub use returning::{ReturnStep, return_step};
