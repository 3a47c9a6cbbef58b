pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod registry;

pub use actor::SessionActor;
pub use commands::SessionCommand;
pub use events::{PositionInfo, SessionEvent, SessionStatus};
pub use handle::SessionHandle;
pub use registry::SessionRegistry;
