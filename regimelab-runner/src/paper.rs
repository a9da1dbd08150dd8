//! Paper executor: an in-memory `OrderExecutor` filling at marked prices.
//!
//! The driver marks each symbol with its latest price before running a
//! cycle; market orders fill at that mark, with no slippage or commission.
//! Cash accounting mirrors the simulator: opening debits the notional,
//! closing credits the notional at entry plus the realized P&L.

use chrono::{DateTime, Utc};
use regimelab_core::domain::Side;
use regimelab_core::ports::{Account, BrokerPosition, Fill, OrderExecutor, OrderSide};
use regimelab_core::{DataUnavailableError, OrderRejectedError};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mark {
    price: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
struct Holding {
    side: Side,
    qty: f64,
    avg_entry_price: f64,
}

impl Holding {
    fn entry_value(&self) -> f64 {
        self.qty * self.avg_entry_price
    }

    fn pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.avg_entry_price) * self.qty
    }
}

#[derive(Debug, Clone)]
pub struct PaperExecutor {
    cash: f64,
    holdings: BTreeMap<String, Holding>,
    marks: BTreeMap<String, Mark>,
    fills: Vec<Fill>,
}

impl PaperExecutor {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            holdings: BTreeMap::new(),
            marks: BTreeMap::new(),
            fills: Vec::new(),
        }
    }

    /// Set the price orders for `symbol` fill at, and the account is valued at.
    pub fn mark(&mut self, symbol: &str, price: f64, timestamp: DateTime<Utc>) {
        self.marks
            .insert(symbol.to_string(), Mark { price, timestamp });
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Every fill so far, oldest first.
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    fn equity(&self) -> f64 {
        let mut equity = self.cash;
        for (symbol, holding) in &self.holdings {
            let price = self
                .marks
                .get(symbol)
                .map(|m| m.price)
                .unwrap_or(holding.avg_entry_price);
            equity = equity + holding.entry_value() + holding.pnl(price);
        }
        equity
    }
}

impl OrderExecutor for PaperExecutor {
    fn place_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        qty: f64,
    ) -> Result<Fill, OrderRejectedError> {
        if !(qty > 0.0) || !qty.is_finite() {
            return Err(OrderRejectedError::new(symbol, format!("invalid quantity {qty}")));
        }
        let mark = self
            .marks
            .get(symbol)
            .copied()
            .ok_or_else(|| OrderRejectedError::new(symbol, "no price marked"))?;
        if !(mark.price > 0.0) {
            return Err(OrderRejectedError::new(
                symbol,
                format!("unusable mark price {}", mark.price),
            ));
        }

        match self.holdings.get_mut(symbol) {
            Some(holding) if OrderSide::closing(holding.side) == side => {
                if qty > holding.qty {
                    return Err(OrderRejectedError::new(
                        symbol,
                        format!("order qty {qty} exceeds held qty {}", holding.qty),
                    ));
                }
                let closed = Holding {
                    qty,
                    ..holding.clone()
                };
                self.cash += closed.entry_value() + closed.pnl(mark.price);
                holding.qty -= qty;
                if holding.qty <= 0.0 {
                    self.holdings.remove(symbol);
                }
            }
            existing => {
                let notional = qty * mark.price;
                if notional > self.cash {
                    return Err(OrderRejectedError::new(
                        symbol,
                        format!("notional {notional:.2} exceeds buying power {:.2}", self.cash),
                    ));
                }
                let position_side = match side {
                    OrderSide::Buy => Side::Long,
                    OrderSide::Sell => Side::Short,
                };
                match existing {
                    Some(holding) => {
                        let total = holding.qty + qty;
                        holding.avg_entry_price =
                            (holding.entry_value() + notional) / total;
                        holding.qty = total;
                    }
                    None => {
                        self.holdings.insert(
                            symbol.to_string(),
                            Holding {
                                side: position_side,
                                qty,
                                avg_entry_price: mark.price,
                            },
                        );
                    }
                }
                self.cash -= notional;
            }
        }

        let fill = Fill {
            symbol: symbol.to_string(),
            side,
            qty,
            price: mark.price,
            timestamp: mark.timestamp,
        };
        debug!(symbol, side = ?side, qty, price = mark.price, cash = self.cash, "paper fill");
        self.fills.push(fill.clone());
        Ok(fill)
    }

    fn get_position(&self, symbol: &str) -> Result<Option<BrokerPosition>, DataUnavailableError> {
        Ok(self.holdings.get(symbol).map(|h| BrokerPosition {
            symbol: symbol.to_string(),
            side: h.side,
            qty: h.qty,
            avg_entry_price: h.avg_entry_price,
        }))
    }

    fn get_account(&self) -> Result<Account, DataUnavailableError> {
        Ok(Account {
            equity: self.equity(),
            cash: self.cash,
            buying_power: self.cash.max(0.0),
        })
    }
}
