//! Compile-time game constants.
//!
//! Nothing here is configurable at runtime; the presentation layer only
//! ever sees the effects.

// === INITIAL STATE ===

pub const INITIAL_GOLD: u64 = 1000;
pub const INITIAL_HUMAN_POWER: f64 = 20.0;
pub const INITIAL_MARKET_TREND: f64 = 0.0;
pub const INITIAL_VOLATILITY: f64 = 0.2;
pub const INITIAL_REPUTATION: f64 = 50.0;
pub const INITIAL_YEAR: u32 = 1;

// === BOUNDS ===

pub const POWER_MIN: f64 = 0.0;
pub const POWER_MAX: f64 = 100.0;
pub const TREND_MIN: f64 = -0.5;
pub const TREND_MAX: f64 = 0.5;
pub const VOLATILITY_MIN: f64 = 0.1;
pub const VOLATILITY_MAX: f64 = 0.4;
pub const REPUTATION_MAX: f64 = 100.0;

// === TIMER INTERVALS (ms) ===

pub const TIME_TICK_MS: u64 = 1_000;
pub const MARKET_TICK_MS: u64 = 15_000;
pub const BALANCE_TICK_MS: u64 = 5_000;
pub const CRAFTING_TICK_MS: u64 = 1_000;
pub const AUTO_PRODUCTION_TICK_MS: u64 = 1_000;
pub const SEASONAL_EVENT_TICK_MS: u64 = 30_000;

/// One in-game day: 24 ticks of one second each
pub const TICKS_PER_DAY: u64 = 24;
pub const DAY_MS: u64 = TICKS_PER_DAY * TIME_TICK_MS;
pub const DAYS_PER_SEASON: u32 = 30;

// === WORLD EVENT PIPELINE (ms) ===

pub const WORLD_EVENT_ROLL_DELAY_MS: u64 = 60_000;
pub const WORLD_EVENT_PRECURSOR_MS: u64 = 30_000;
pub const WORLD_EVENT_DISPLAY_MS: u64 = 5_000;

// === MARKET DRIFT ===

pub const TREND_STEP: f64 = 0.2;
pub const VOLATILITY_STEP: f64 = 0.05;

// === FACTION BALANCE ===

pub const REBALANCE_RATE: f64 = 0.05;
pub const REBALANCE_MAX_STEP: f64 = 1.0;

// === CRAFTING ===

pub const EXP_PER_LEVEL_UNIT: u64 = 100;
pub const TIME_REDUCTION_PER_LEVEL: f64 = 0.05;
pub const MIN_TIME_FACTOR: f64 = 0.5;
pub const QUALITY_LEVEL_STEP: u32 = 5;
pub const QUALITY_PER_STEP: f64 = 0.2;
pub const PRICE_PER_POWER: f64 = 20.0;

// === AUTO-PRODUCTION ===

pub const AUTO_PRODUCTION_UNLOCK_LEVEL: u32 = 5;
pub const AUTO_PRODUCTION_LEVEL_PENALTY: u32 = 2;
pub const AUTO_PRODUCTION_EFFICIENCY: f64 = 0.8;
/// Unlock level of each slot, by slot index
pub const AUTO_PRODUCTION_SLOT_LEVELS: [u32; 3] = [5, 10, 15];

// === SEASONAL EVENTS ===

/// How active seasonal events leave the active list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalExpiry {
    /// Cleared only when the season changes
    SeasonBoundary,
    /// Also dropped once the calendar day passes the event's end day
    EndDay,
}

pub const SEASONAL_EXPIRY: SeasonalExpiry = SeasonalExpiry::SeasonBoundary;
