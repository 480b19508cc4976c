//! World simulation: market drift, faction rebalancing, the calendar,
//! seasonal events and the random world event pipeline.
//!
//! Each function here is the body of one timer firing. Random draws go
//! through a caller-supplied `Rng` so runs can be replayed from a seed.

use rand::Rng;

use crate::catalog::{season_def, seasonal_event_def, seasonal_events, world_event_def};
use crate::config::{self, SeasonalExpiry};
use crate::state::{ActiveSeasonalEvent, GameState, Signal, WorldEventStage};
use crate::types::{Faction, Season, SeasonalEventId, WorldEventKind};

// === TIME ===

/// One second of play
pub fn time_tick(state: &mut GameState) {
    state.elapsed_time += 1;
}

// === MARKET ===

/// Random walk of the market trend and volatility
pub fn market_drift<R: Rng>(state: &mut GameState, rng: &mut R) {
    let trend_change = rng.random_range(-config::TREND_STEP..config::TREND_STEP);
    let volatility_change = rng.random_range(-config::VOLATILITY_STEP..config::VOLATILITY_STEP);

    state.market.set_trend(state.market.trend() + trend_change);
    state
        .market
        .set_volatility(state.market.volatility() * (1.0 + volatility_change));

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "market",
        clock_ms = state.clock_ms,
        trend = state.market.trend(),
        volatility = state.market.volatility(),
    );
}

// === FACTION BALANCE ===

/// Pull the faction balance back toward parity.
///
/// The stronger side loses `min(|human - monster| * 0.05, 1)` per tick.
pub fn rebalance(state: &mut GameState) {
    let human = state.balance.human();
    let monster = state.balance.monster();
    let change = ((human - monster).abs() * config::REBALANCE_RATE).min(config::REBALANCE_MAX_STEP);

    if human > monster {
        state.balance.shift_toward(Faction::Monster, change);
    } else if monster > human {
        state.balance.shift_toward(Faction::Human, change);
    }

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "balance",
        clock_ms = state.clock_ms,
        human_power = state.balance.human(),
        monster_power = state.balance.monster(),
        change = change,
    );
}

// === CALENDAR ===

/// Advance the calendar by one day, rolling over seasons and years.
///
/// A season change clears every active seasonal event.
pub fn advance_day(state: &mut GameState, signals: &mut Vec<Signal>) {
    let calendar = &mut state.calendar;
    calendar.day += 1;

    if calendar.day >= config::DAYS_PER_SEASON {
        calendar.day = 0;
        calendar.season = calendar.season.next();
        if calendar.season == Season::Spring {
            calendar.year += 1;
        }
        state.active_seasonal_events.clear();
        signals.push(Signal::SeasonChanged {
            season: calendar.season,
            year: calendar.year,
        });
    } else {
        expire_seasonal_events(state, config::SEASONAL_EXPIRY);
    }

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "calendar",
        clock_ms = state.clock_ms,
        season = season_def(state.calendar.season).name,
        day = state.calendar.day,
        year = state.calendar.year,
    );
}

/// Drop events that have run their course under the given policy
pub fn expire_seasonal_events(state: &mut GameState, policy: SeasonalExpiry) {
    match policy {
        SeasonalExpiry::SeasonBoundary => {}
        SeasonalExpiry::EndDay => {
            let day = state.calendar.day;
            state
                .active_seasonal_events
                .retain(|event| day < event.end_day);
        }
    }
}

// === SEASONAL EVENTS ===

/// Maybe start one of the current season's events.
///
/// Returns the event started, if any. An event that is already active is
/// not restarted.
pub fn roll_seasonal_event<R: Rng>(
    state: &mut GameState,
    rng: &mut R,
    signals: &mut Vec<Signal>,
) -> Option<SeasonalEventId> {
    let season = state.calendar.season;
    let roll: f64 = rng.random();
    if roll >= season_def(season).event_chance {
        return None;
    }

    let candidates = seasonal_events(season);
    if candidates.is_empty() {
        return None;
    }
    let id = candidates[rng.random_range(0..candidates.len())];
    if state.active_seasonal_events.iter().any(|e| e.id == id) {
        return None;
    }

    let def = seasonal_event_def(id);
    let start_day = state.calendar.day;
    state.active_seasonal_events.push(ActiveSeasonalEvent {
        id,
        start_day,
        end_day: start_day + def.duration,
    });
    signals.push(Signal::SeasonalEventStarted { event: id });

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "seasonal_event",
        clock_ms = state.clock_ms,
        event = def.name,
        start_day = start_day,
        end_day = start_day + def.duration,
    );

    Some(id)
}

// === WORLD EVENT PIPELINE ===

/// Stage of the world event pipeline a one-shot timer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorldEventPhase {
    /// Pick a kind and maybe foreshadow it
    Roll,
    /// Maybe fire the foreshadowed event
    Resolve,
    /// Hide the event again
    Clear,
}

/// One-shot timer to arm after a pipeline stage ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPhase {
    pub phase: WorldEventPhase,
    pub delay_ms: u64,
}

impl NextPhase {
    fn rearm() -> Self {
        Self {
            phase: WorldEventPhase::Roll,
            delay_ms: config::WORLD_EVENT_ROLL_DELAY_MS,
        }
    }
}

/// Run one pipeline stage and return the stage to arm next.
///
/// Every outcome leads back to a fresh roll, so the pipeline never stalls.
pub fn run_world_event_phase<R: Rng>(
    state: &mut GameState,
    phase: WorldEventPhase,
    rng: &mut R,
    signals: &mut Vec<Signal>,
) -> NextPhase {
    match phase {
        WorldEventPhase::Roll => roll_world_event(state, rng, signals),
        WorldEventPhase::Resolve => resolve_world_event(state, rng, signals),
        WorldEventPhase::Clear => clear_world_event(state, signals),
    }
}

fn roll_world_event<R: Rng>(
    state: &mut GameState,
    rng: &mut R,
    signals: &mut Vec<Signal>,
) -> NextPhase {
    let kind = WorldEventKind::ALL[rng.random_range(0..WorldEventKind::ALL.len())];
    let def = world_event_def(kind);
    let roll: f64 = rng.random();
    if roll >= def.precursor_chance || def.precursor_messages.is_empty() {
        return NextPhase::rearm();
    }

    let message =
        def.precursor_messages[rng.random_range(0..def.precursor_messages.len())].to_string();
    state.world_event = WorldEventStage::Precursor {
        kind,
        message: message.clone(),
    };
    signals.push(Signal::WorldEventPrecursor { kind, message });

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "world_event",
        clock_ms = state.clock_ms,
        kind = def.name,
        stage = "precursor",
    );

    NextPhase {
        phase: WorldEventPhase::Resolve,
        delay_ms: config::WORLD_EVENT_PRECURSOR_MS,
    }
}

fn resolve_world_event<R: Rng>(
    state: &mut GameState,
    rng: &mut R,
    signals: &mut Vec<Signal>,
) -> NextPhase {
    let WorldEventStage::Precursor { kind, .. } = state.world_event else {
        state.world_event = WorldEventStage::Idle;
        return NextPhase::rearm();
    };

    let roll: f64 = rng.random();
    if roll >= world_event_def(kind).event_chance {
        state.world_event = WorldEventStage::Idle;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "world_event",
            clock_ms = state.clock_ms,
            kind = world_event_def(kind).name,
            stage = "fizzled",
        );

        return NextPhase::rearm();
    }

    apply_world_event(state, kind);
    state.world_event = WorldEventStage::Active { kind };
    signals.push(Signal::WorldEventStarted { kind });

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "world_event",
        clock_ms = state.clock_ms,
        kind = world_event_def(kind).name,
        stage = "active",
        human_power = state.balance.human(),
        trend = state.market.trend(),
    );

    NextPhase {
        phase: WorldEventPhase::Clear,
        delay_ms: config::WORLD_EVENT_DISPLAY_MS,
    }
}

fn clear_world_event(state: &mut GameState, signals: &mut Vec<Signal>) -> NextPhase {
    if let WorldEventStage::Active { kind } = state.world_event {
        signals.push(Signal::WorldEventEnded { kind });
    }
    state.world_event = WorldEventStage::Idle;
    NextPhase::rearm()
}

/// Apply a world event's effect on the faction balance or the market
pub fn apply_world_event(state: &mut GameState, kind: WorldEventKind) {
    match kind {
        WorldEventKind::HeroArrival => state.balance.shift_toward(Faction::Human, 15.0),
        WorldEventKind::DragonAttack => state.balance.shift_toward(Faction::Monster, 15.0),
        WorldEventKind::MarketBoom => {
            state.market.set_trend(state.market.trend() + 0.3);
            state
                .market
                .set_volatility(state.market.volatility() * 1.5);
        }
    }
}
