//! Timers driven by an injected millisecond clock.
//!
//! Interval timers re-arm themselves when they fire; one-shot timers are
//! removed. Nothing here reads a wall clock: the caller says how far time
//! has advanced and pops the timers that came due, oldest first.

use crate::config;
use crate::world::WorldEventPhase;

/// What a timer does when it fires. Declaration order breaks ties between
/// timers due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    Time,
    Crafting,
    AutoProduction,
    Balance,
    Market,
    Calendar,
    SeasonalEvent,
    WorldEvent(WorldEventPhase),
}

impl TimerKind {
    /// Fixed-interval timers armed when a game starts
    pub const INTERVALS: [(TimerKind, u64); 7] = [
        (TimerKind::Time, config::TIME_TICK_MS),
        (TimerKind::Crafting, config::CRAFTING_TICK_MS),
        (TimerKind::AutoProduction, config::AUTO_PRODUCTION_TICK_MS),
        (TimerKind::Balance, config::BALANCE_TICK_MS),
        (TimerKind::Market, config::MARKET_TICK_MS),
        (TimerKind::Calendar, config::DAY_MS),
        (TimerKind::SeasonalEvent, config::SEASONAL_EVENT_TICK_MS),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    kind: TimerKind,
    due_at: u64,
    interval: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every `interval_ms`, first at `now + interval_ms`
    pub fn every(&mut self, kind: TimerKind, interval_ms: u64, now: u64) {
        self.timers.push(Timer {
            kind,
            due_at: now.saturating_add(interval_ms),
            interval: Some(interval_ms.max(1)),
        });
    }

    /// Fire once at `now + delay_ms`
    pub fn once(&mut self, kind: TimerKind, delay_ms: u64, now: u64) {
        self.timers.push(Timer {
            kind,
            due_at: now.saturating_add(delay_ms),
            interval: None,
        });
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// along with the instant it was due. Interval timers are re-armed.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerKind, u64)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_at <= until)
            .min_by_key(|(_, timer)| (timer.due_at, timer.kind))
            .map(|(index, _)| index)?;

        let timer = self.timers[index];
        match timer.interval {
            Some(interval) => {
                self.timers[index].due_at = timer.due_at.saturating_add(interval);
            }
            None => {
                self.timers.swap_remove(index);
            }
        }
        Some((timer.kind, timer.due_at))
    }

    /// Tear down every timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// When the given kind fires next, if armed
    pub fn next_due(&self, kind: TimerKind) -> Option<u64> {
        self.timers
            .iter()
            .filter(|timer| timer.kind == kind)
            .map(|timer| timer.due_at)
            .min()
    }
}
