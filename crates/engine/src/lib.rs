pub mod clock;
pub mod lifecycle;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::TradeLifecycle;
pub use rng::{OsRandom, RandomSource, SeededRandom};
