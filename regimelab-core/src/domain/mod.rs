//! Domain types for RegimeLab

pub mod action;
pub mod bar;
pub mod mode;
pub mod position;
pub mod trade;

pub use action::{Action, BailoutCause, Decision, ExitReason, StrategyExit};
pub use bar::{first_unordered, Bar};
pub use mode::{Mode, Side};
pub use position::Position;
pub use trade::{EquityPoint, TradeRecord};
