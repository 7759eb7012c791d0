pub mod session;

pub use session::{GuestEvent, GuestSession};
