//! Live decision cycle over the collaborator ports.
//!
//! One cycle for one symbol: fetch bars, analyze, read the broker's position
//! and account, decide, execute. Brokers know nothing about regimes, so the
//! session keeps its own ledger of the mode (and time) each open position was
//! entered under.
//!
//! Failures leave the ledger untouched: an order the executor rejects is
//! reported to the caller and nothing is recorded.

use chrono::{DateTime, Utc};
use regimelab_core::domain::{Action, Decision, Mode, Position, Side};
use regimelab_core::ports::{DataSource, Fill, OrderExecutor, OrderSide};
use regimelab_core::{
    ConditionAnalyzer, CycleError, DecisionEngine, MarketConditions, ModeSelector,
    OrderRejectedError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, info_span, warn};

use crate::config::RunConfig;

/// What the session remembers about a position it opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub mode_at_entry: Mode,
    pub entry_timestamp: DateTime<Utc>,
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub symbol: String,
    pub conditions: MarketConditions,
    pub decision: Decision,
    /// The fill, when the decision placed an order.
    pub fill: Option<Fill>,
}

pub struct TradingSession<D, E> {
    data: D,
    executor: E,
    analyzer: ConditionAnalyzer,
    engine: DecisionEngine,
    lookback: usize,
    ledger: BTreeMap<String, LedgerEntry>,
}

impl<D: DataSource, E: OrderExecutor> TradingSession<D, E> {
    pub fn new(config: &RunConfig, data: D, executor: E) -> Self {
        Self {
            data,
            executor,
            analyzer: ConditionAnalyzer::new(config.indicators.clone()),
            engine: DecisionEngine::new(config.trading.clone()),
            lookback: config.backtest.lookback,
            ledger: BTreeMap::new(),
        }
    }

    pub fn data_source(&self) -> &D {
        &self.data
    }

    pub fn data_source_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn ledger(&self) -> &BTreeMap<String, LedgerEntry> {
        &self.ledger
    }

    /// Run one decision cycle for `symbol`.
    ///
    /// Every error is scoped to this cycle: insufficient or unavailable data
    /// means nothing was attempted, a risk violation means an entry was
    /// refused, an order rejection means the broker and the ledger are
    /// unchanged.
    pub fn run_cycle(&mut self, symbol: &str) -> Result<CycleReport, CycleError> {
        let _span = info_span!("cycle", symbol).entered();

        let bars = self.data.get_bars(symbol, self.lookback)?;
        let conditions = self.analyzer.analyze(&bars)?;
        let held = self.executor.get_position(symbol)?;
        let account = self.executor.get_account()?;

        let position = held.map(|bp| {
            let entry = self.ledger.get(symbol).copied().unwrap_or_else(|| {
                let mode = ModeSelector::select(&conditions, self.engine.config());
                warn!(%mode, "broker position not in ledger, adopting current mode");
                LedgerEntry {
                    mode_at_entry: mode,
                    entry_timestamp: conditions.as_of,
                }
            });
            Position::new(
                symbol,
                bp.side,
                bp.qty,
                bp.avg_entry_price,
                entry.entry_timestamp,
                entry.mode_at_entry,
            )
        });

        let decision = self
            .engine
            .decide(symbol, &conditions, position.as_ref(), account.equity)?;

        let fill = match &decision.action {
            Action::OpenLong { qty, .. } => {
                Some(self.open(symbol, Side::Long, *qty, decision.mode)?)
            }
            Action::OpenShort { qty, .. } => {
                Some(self.open(symbol, Side::Short, *qty, decision.mode)?)
            }
            Action::Close { reason, qty, .. } => {
                let fill = self.close(symbol, position.as_ref(), *qty)?;
                info!(%reason, price = fill.price, "closed position");
                Some(fill)
            }
            Action::SwitchMode { from, to } => {
                info!(%from, %to, "regime changed under open position");
                None
            }
            Action::Hold => None,
        };

        Ok(CycleReport {
            symbol: symbol.to_string(),
            conditions,
            decision,
            fill,
        })
    }

    /// Run one cycle per symbol. Each symbol's failure is independent.
    pub fn run_all(
        &mut self,
        symbols: &[String],
    ) -> Vec<(String, Result<CycleReport, CycleError>)> {
        symbols
            .iter()
            .map(|symbol| {
                let outcome = self.run_cycle(symbol);
                if let Err(e) = &outcome {
                    warn!(symbol = %symbol, error = %e, "cycle failed");
                }
                (symbol.clone(), outcome)
            })
            .collect()
    }

    /// Flatten `position`. Without a held position there is no side to
    /// trade against, so nothing is sent to the executor.
    fn close(
        &mut self,
        symbol: &str,
        position: Option<&Position>,
        qty: f64,
    ) -> Result<Fill, CycleError> {
        let Some(position) = position else {
            warn!("close decided without a held position");
            return Err(OrderRejectedError::new(symbol, "no held position to close").into());
        };
        let fill = self
            .executor
            .place_order(symbol, OrderSide::closing(position.side), qty)?;
        self.ledger.remove(symbol);
        Ok(fill)
    }

    fn open(
        &mut self,
        symbol: &str,
        side: Side,
        qty: f64,
        mode: Mode,
    ) -> Result<Fill, CycleError> {
        let fill = self
            .executor
            .place_order(symbol, OrderSide::opening(side), qty)?;
        self.ledger.insert(
            symbol.to_string(),
            LedgerEntry {
                mode_at_entry: mode,
                entry_timestamp: fill.timestamp,
            },
        );
        info!(%side, qty, price = fill.price, %mode, "opened position");
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::StaticDataSource;
    use crate::paper::PaperExecutor;
    use chrono::{Duration, TimeZone};
    use regimelab_core::domain::Bar;
    use regimelab_core::ports::{Account, BrokerPosition};
    use regimelab_core::DataUnavailableError;

    fn zigzag_bars(n: usize) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let mut close = 100.0_f64;
        (0..n)
            .map(|i| {
                let open = close;
                if i > 0 {
                    close += if i % 2 == 1 { 2.0 } else { -1.0 };
                }
                Bar::new(
                    base + Duration::days(i as i64),
                    open,
                    open.max(close) * 1.002,
                    open.min(close) * 0.998,
                    close,
                    1_000.0,
                )
            })
            .collect()
    }

    /// Executor that refuses every order.
    struct RejectingExecutor;

    impl OrderExecutor for RejectingExecutor {
        fn place_order(
            &mut self,
            symbol: &str,
            _side: OrderSide,
            _qty: f64,
        ) -> Result<Fill, OrderRejectedError> {
            Err(OrderRejectedError::new(symbol, "market closed"))
        }

        fn get_position(
            &self,
            _symbol: &str,
        ) -> Result<Option<BrokerPosition>, DataUnavailableError> {
            Ok(None)
        }

        fn get_account(&self) -> Result<Account, DataUnavailableError> {
            Ok(Account {
                equity: 10_000.0,
                cash: 10_000.0,
                buying_power: 10_000.0,
            })
        }
    }

    #[test]
    fn unknown_symbol_is_data_unavailable() {
        let source = StaticDataSource::new();
        let mut session =
            TradingSession::new(&RunConfig::default(), source, PaperExecutor::new(10_000.0));
        assert!(matches!(
            session.run_cycle("NOPE"),
            Err(CycleError::DataUnavailable(_))
        ));
    }

    #[test]
    fn short_history_is_insufficient_data() {
        let source = StaticDataSource::new().with_series("SPY", zigzag_bars(30));
        let mut session =
            TradingSession::new(&RunConfig::default(), source, PaperExecutor::new(10_000.0));
        assert!(matches!(
            session.run_cycle("SPY"),
            Err(CycleError::InsufficientData(_))
        ));
    }

    #[test]
    fn opening_records_mode_in_ledger() {
        let bars = zigzag_bars(200);
        let mut session = TradingSession::new(
            &RunConfig::default(),
            StaticDataSource::new().with_series("SPY", bars.clone()),
            PaperExecutor::new(10_000.0),
        );

        // Walk forward until the session opens something.
        let mut opened = None;
        for bar in &bars[59..] {
            session.data_source_mut().set_cursor(bar.timestamp);
            session.executor_mut().mark("SPY", bar.close, bar.timestamp);
            let report = session.run_cycle("SPY").unwrap();
            if report.decision.action.is_open() {
                opened = Some(report);
                break;
            }
        }
        let report = opened.expect("zigzag uptrend should open a position");
        let entry = session.ledger()["SPY"];
        assert_eq!(entry.mode_at_entry, report.decision.mode);
        assert_eq!(Some(entry.entry_timestamp), report.fill.map(|f| f.timestamp));
    }

    #[test]
    fn rejected_order_leaves_ledger_untouched() {
        let bars = zigzag_bars(200);
        let mut session = TradingSession::new(
            &RunConfig::default(),
            StaticDataSource::new().with_series("SPY", bars.clone()),
            RejectingExecutor,
        );

        let mut rejected = false;
        for bar in &bars[59..] {
            session.data_source_mut().set_cursor(bar.timestamp);
            if let Err(CycleError::OrderRejected(_)) = session.run_cycle("SPY") {
                rejected = true;
                break;
            }
        }
        assert!(rejected);
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn close_without_position_places_no_order() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let mut session = TradingSession::new(
            &RunConfig::default(),
            StaticDataSource::new(),
            PaperExecutor::new(10_000.0),
        );
        session.executor_mut().mark("SPY", 100.0, ts);

        let err = session.close("SPY", None, 5.0).unwrap_err();
        assert!(matches!(err, CycleError::OrderRejected(_)));
        assert!(session.executor().fills().is_empty());
    }

    #[test]
    fn close_trades_against_the_held_side() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let mut session = TradingSession::new(
            &RunConfig::default(),
            StaticDataSource::new(),
            PaperExecutor::new(10_000.0),
        );
        session.executor_mut().mark("SPY", 100.0, ts);
        session.open("SPY", Side::Short, 5.0, Mode::Bear).unwrap();
        let short = Position::new("SPY", Side::Short, 5.0, 100.0, ts, Mode::Bear);

        let fill = session.close("SPY", Some(&short), 5.0).unwrap();
        assert_eq!(fill.side, OrderSide::closing(Side::Short));
        assert!(session.ledger().is_empty());
        assert!(session.executor().get_position("SPY").unwrap().is_none());
    }

    #[test]
    fn run_all_isolates_failures() {
        let source = StaticDataSource::new().with_series("SPY", zigzag_bars(100));
        let mut session =
            TradingSession::new(&RunConfig::default(), source, PaperExecutor::new(10_000.0));
        session
            .executor_mut()
            .mark("SPY", 100.0, Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap());
        let outcomes = session.run_all(&["MISSING".to_string(), "SPY".to_string()]);
        assert!(outcomes[0].1.is_err());
        assert!(outcomes[1].1.is_ok());
    }
}
