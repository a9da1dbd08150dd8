//! Error taxonomy shared by the analyzer, decision engine and collaborators.

use thiserror::Error;

/// The analyzer cannot produce a conditions snapshot from the window it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsufficientDataError {
    #[error("need at least {required} bars, got {available}")]
    TooFewBars { required: usize, available: usize },

    #[error("indicator {indicator} is undefined at the last bar (void bars in window?)")]
    UndefinedIndicator { indicator: String },
}

/// A data collaborator could not serve the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("data unavailable for '{symbol}': {reason}")]
pub struct DataUnavailableError {
    pub symbol: String,
    pub reason: String,
}

impl DataUnavailableError {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// A sized entry was refused. Never fatal: the cycle reports it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskViolationError {
    #[error("position size rounds to {qty} units at price {price} (equity {equity})")]
    SubUnitQuantity { qty: f64, price: f64, equity: f64 },

    #[error("cannot size a position with non-positive equity {equity}")]
    NonPositiveEquity { equity: f64 },

    #[error("cannot size a position at non-positive price {price}")]
    InvalidPrice { price: f64 },
}

/// The order executor refused an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order for '{symbol}' rejected: {reason}")]
pub struct OrderRejectedError {
    pub symbol: String,
    pub reason: String,
}

impl OrderRejectedError {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Anything that can abort a single live decision cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleError {
    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),

    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailableError),

    #[error(transparent)]
    RiskViolation(#[from] RiskViolationError),

    #[error(transparent)]
    OrderRejected(#[from] OrderRejectedError),
}
