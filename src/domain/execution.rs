//! Fill pricing and commissions.
//!
//! Every fill pays half the spread plus slippage against the trader:
//! buys fill above the quoted price, sells below. Slippage is
//! `quoted * slippage_rate * m` with the multiplier `m` drawn from a
//! caller-supplied [`SlippageSource`].

use rand::Rng;

use crate::domain::signal::Direction;

/// Range the random slippage multiplier is drawn from.
pub const SLIPPAGE_MULTIPLIER_MIN: f64 = 0.5;
pub const SLIPPAGE_MULTIPLIER_MAX: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_rate: f64,
    pub spread_rate: f64,
    pub slippage_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            commission_rate: 0.0002,
            spread_rate: 0.0001,
            slippage_rate: 0.0001,
        }
    }
}

/// Source of the per-fill slippage multiplier.
pub trait SlippageSource {
    fn multiplier(&mut self) -> f64;
}

/// Uniform multiplier in [`SLIPPAGE_MULTIPLIER_MIN`, `SLIPPAGE_MULTIPLIER_MAX`].
#[derive(Debug, Clone)]
pub struct RandomSlippage<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomSlippage<R> {
    pub fn new(rng: R) -> Self {
        RandomSlippage { rng }
    }
}

impl<R: Rng> SlippageSource for RandomSlippage<R> {
    fn multiplier(&mut self) -> f64 {
        self.rng
            .gen_range(SLIPPAGE_MULTIPLIER_MIN..=SLIPPAGE_MULTIPLIER_MAX)
    }
}

/// Constant multiplier, for reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSlippage(pub f64);

impl SlippageSource for FixedSlippage {
    fn multiplier(&mut self) -> f64 {
        self.0
    }
}

impl CostModel {
    /// Price paid (buy) or received (sell) on a fill at `quoted`.
    fn fill_price(&self, quoted: f64, side: Direction, slippage: &mut dyn SlippageSource) -> f64 {
        let half_spread = quoted * self.spread_rate / 2.0;
        let slip = quoted * self.slippage_rate * slippage.multiplier();
        quoted + side.sign() * (half_spread + slip)
    }

    pub fn entry_price(
        &self,
        quoted: f64,
        direction: Direction,
        slippage: &mut dyn SlippageSource,
    ) -> f64 {
        self.fill_price(quoted, direction, slippage)
    }

    /// Closing a long sells, closing a short buys.
    pub fn exit_price(
        &self,
        quoted: f64,
        direction: Direction,
        slippage: &mut dyn SlippageSource,
    ) -> f64 {
        let side = match direction {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        };
        self.fill_price(quoted, side, slippage)
    }

    /// Commission on the executed notional `volume * price`.
    pub fn commission(&self, volume: f64, price: f64) -> f64 {
        volume * price * self.commission_rate
    }
}
