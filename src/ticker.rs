//! Simulated live price feed for the dashboard stock widget.
//!
//! [`PriceSimulator`] is the deterministic math; [`Ticker`] runs it on a
//! fixed interval in a spawned task and publishes each window through a
//! `watch` channel. The task is the only writer.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::Config;
use crate::types::PortfolioEntry;

/// Phase advance per tick
pub const PHASE_STEP: f64 = 0.12;

const PRIMARY_AMPLITUDE: f64 = 3.0;
const SECONDARY_AMPLITUDE: f64 = 0.4;
const SECONDARY_FREQUENCY: f64 = 2.5;

/// One simulated price point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    /// Strictly increasing tick counter, starting at 1
    pub index: u64,
    /// Rounded to two decimals
    pub price: f64,
    pub at: DateTime<Utc>,
}

/// Sliding window of simulated prices
#[derive(Debug, Clone)]
pub struct PriceSimulator {
    base: f64,
    tick: u64,
    capacity: usize,
    window: VecDeque<PriceSample>,
}

impl PriceSimulator {
    pub fn new(base: f64, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            base,
            tick: 0,
            capacity,
            window: VecDeque::with_capacity(capacity),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ticker_base_price, config.ticker_window)
    }

    /// Resume the curve at the tick wall time has reached, one tick per `period`.
    ///
    /// Quotes taken within the same period agree with each other.
    pub fn aligned_to(mut self, now: DateTime<Utc>, period: Duration) -> Self {
        let elapsed = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let period = u64::try_from(period.as_millis()).unwrap_or(u64::MAX).max(1);
        self.tick = elapsed / period;
        self
    }

    /// Price at a given phase, rounded to cents
    pub fn price_at(base: f64, phase: f64) -> f64 {
        let raw = base
            + phase.sin() * PRIMARY_AMPLITUDE
            + (phase * SECONDARY_FREQUENCY).sin() * SECONDARY_AMPLITUDE;
        (raw * 100.0).round() / 100.0
    }

    /// Produce the next sample, evicting the oldest when full
    pub fn advance(&mut self, at: DateTime<Utc>) -> PriceSample {
        self.tick += 1;

        let sample = PriceSample {
            index: self.tick,
            price: Self::price_at(self.base, self.tick as f64 * PHASE_STEP),
            at,
        };

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
        sample
    }

    pub fn samples(&self) -> Vec<PriceSample> {
        self.window.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<PriceSample> {
        self.window.back().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Spawns the ticker task
#[derive(Debug)]
pub struct Ticker;

impl Ticker {
    /// Start ticking every `period`; the first sample lands one period in.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(mut simulator: PriceSimulator, period: Duration) -> TickerHandle {
        let (tx, rx) = watch::channel(simulator.samples());

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let sample = simulator.advance(Utc::now());
                debug!(index = sample.index, price = sample.price, "Ticker sample");

                if tx.send(simulator.samples()).is_err() {
                    // Every receiver is gone
                    break;
                }
            }
        });

        TickerHandle { rx, task }
    }
}

/// Reader side of a running ticker. Dropping it stops the task.
#[derive(Debug)]
pub struct TickerHandle {
    rx: watch::Receiver<Vec<PriceSample>>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Current window, oldest first
    pub fn snapshot(&self) -> Vec<PriceSample> {
        self.rx.borrow().clone()
    }

    pub fn latest_price(&self) -> Option<f64> {
        self.rx.borrow().last().map(|s| s.price)
    }

    /// Wait for the next published window; `false` once the ticker stopped
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Market value of a position at `price`; `None` for non-finite prices or overflow
pub fn estimated_value(entry: &PortfolioEntry, price: f64) -> Option<Decimal> {
    let price = Decimal::try_from(price).ok()?;
    Some(price.checked_mul(Decimal::from(entry.quantity))?.round_dp(2))
}
