//! Named timer slots for the session loop.
//!
//! Each [`TimerKind`] owns at most one pending deadline. Scheduling a kind
//! replaces whatever was pending for it, so a purpose can never have two
//! live timers. Periodic slots re-arm themselves when taken.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Purpose of a scheduled wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Run a discovery pass (host re-query or post-disconnect retry)
    Rediscover,
    /// Open the presence channel after the startup grace period
    SessionStart,
    /// Periodic host liveness re-check
    LivenessCheck,
    /// Periodic activity cycle
    ActivityRepeat,
    /// Explored announce of the in-flight object
    Explored,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerKind::Rediscover => "rediscover",
            TimerKind::SessionStart => "session-start",
            TimerKind::LivenessCheck => "liveness-check",
            TimerKind::ActivityRepeat => "activity-repeat",
            TimerKind::Explored => "explored",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    at: Instant,
    period: Option<Duration>,
}

/// Table of pending deadlines, one per kind
#[derive(Debug, Default)]
pub struct Timers {
    slots: BTreeMap<TimerKind, Slot>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire once after `delay`, replacing any pending timer of this kind
    pub fn schedule_once(&mut self, kind: TimerKind, delay: Duration) {
        self.slots.insert(
            kind,
            Slot {
                at: Instant::now() + delay,
                period: None,
            },
        );
    }

    /// Fire every `period`, first after one period, replacing any pending timer of this kind
    pub fn schedule_every(&mut self, kind: TimerKind, period: Duration) {
        self.slots.insert(
            kind,
            Slot {
                at: Instant::now() + period,
                period: Some(period),
            },
        );
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slots.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.slots.clear();
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn scheduled(&self) -> Vec<TimerKind> {
        self.slots.keys().copied().collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|slot| slot.at).min()
    }

    /// Take the earliest kind due at `now`, if any.
    /// Periodic kinds are re-armed one period after their deadline.
    ///
    /// Callers drain with repeated calls, so a kind cancelled by an earlier
    /// firing in the same instant is never returned.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerKind> {
        let (kind, slot) = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.at <= now)
            .min_by_key(|(kind, slot)| (slot.at, **kind))
            .map(|(kind, slot)| (*kind, *slot))?;

        match slot.period {
            Some(period) => {
                let mut next = slot.at + period;
                if next <= now {
                    next = now + period;
                }
                self.slots.insert(kind, Slot { at: next, ..slot });
            }
            None => {
                self.slots.remove(&kind);
            }
        }
        Some(kind)
    }
}
