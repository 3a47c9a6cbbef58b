pub mod account;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod position;
pub mod strategy;
pub mod traits;

pub use account::{AccountDelta, AccountPatch, AccountRecord};
pub use config::{AppConfig, SessionConfig, SimulationConfig};
pub use config_loader::ConfigLoader;
pub use error::TradeError;
pub use events::{TradeOutcome, TradeResult};
pub use position::{PositionState, RunningPosition, Settlement};
pub use strategy::Strategy;
pub use traits::{AccountStore, StrategySource, TextRecognizer};
