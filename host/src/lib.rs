pub mod config;
pub mod constants;
pub mod net;
pub mod resources;
pub mod runner;
pub mod session;
pub mod systems;

pub use config::init_tracing;
pub use net::{GuestLink, LoopbackListener, loopback};
pub use resources::Outbound;
pub use runner::{HostCommand, HostLoop};
pub use session::{HostSession, LobbyError};
