//! Single-level timing wheel.
//!
//! `slot_count` slots of `slot_duration` each give a horizon of
//! `slot_count * slot_duration`. The wheel's tick zero is the first timestamp it ever sees.
//! Entries carry their absolute target tick, so an entry scheduled a full horizon ahead
//! can share a slot with the current tick without firing early.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelError {
    #[error("Expiry tick {tick} is beyond the wheel horizon (current tick {current}, {slots} slots)")]
    HorizonExceeded { tick: u64, current: u64, slots: usize },

    #[error("Timing wheel has not observed a timestamp yet")]
    Unanchored,

    #[error("Invalid wheel geometry: {0}")]
    InvalidGeometry(&'static str),
}

/// What to do with an entry once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Drop the entry.
    Release,
    /// Schedule the same key again at the given timestamp.
    Rearm(Duration),
}

#[derive(Debug, Clone, Copy)]
struct Entry<K> {
    tick: u64,
    key: K,
}

/// Timing wheel holding keys rather than callbacks; the owner decides what firing means.
#[derive(Debug)]
pub struct TimingWheel<K> {
    slots: Vec<Vec<Entry<K>>>,
    slot_duration: Duration,
    base: Option<Duration>,
    current_tick: u64,
    pending: usize,
}

impl<K: Copy> TimingWheel<K> {
    pub fn new(slot_count: usize, slot_duration: Duration) -> Result<Self, WheelError> {
        if slot_count == 0 {
            return Err(WheelError::InvalidGeometry("slot count must be non-zero"));
        }
        if slot_duration.is_zero() {
            return Err(WheelError::InvalidGeometry("slot duration must be non-zero"));
        }

        Ok(Self {
            slots: (0..slot_count).map(|_| Vec::new()).collect(),
            slot_duration,
            base: None,
            current_tick: 0,
            pending: 0,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Longest delay representable from the current tick.
    pub fn horizon(&self) -> Duration {
        let slots = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slot_duration.saturating_mul(slots)
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Number of scheduled entries not yet fired.
    pub fn len(&self) -> usize {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Tick a timestamp falls into, or `None` before the first `advance`.
    pub fn tick_of(&self, timestamp: Duration) -> Option<u64> {
        self.base.map(|base| self.ticks_between(base, timestamp))
    }

    fn ticks_between(&self, base: Duration, timestamp: Duration) -> u64 {
        let elapsed = timestamp.saturating_sub(base).as_nanos();
        let ticks = elapsed / self.slot_duration.as_nanos();
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Schedules `key` to fire once the clock has moved past `expire_at`'s tick.
    ///
    /// Already-due expiries are pushed to the next tick. Returns the tick the entry was
    /// placed on.
    pub fn schedule(&mut self, key: K, expire_at: Duration) -> Result<u64, WheelError> {
        let mut tick = self.tick_of(expire_at).ok_or(WheelError::Unanchored)?;

        let slots = self.slots.len();
        if tick > self.current_tick.saturating_add(slots as u64) {
            return Err(WheelError::HorizonExceeded {
                tick,
                current: self.current_tick,
                slots,
            });
        }
        if tick <= self.current_tick {
            tick = self.current_tick + 1;
        }

        self.slots[(tick % slots as u64) as usize].push(Entry { tick, key });
        self.pending += 1;
        Ok(tick)
    }

    /// Moves the clock to `timestamp`, firing every entry whose tick has passed.
    ///
    /// The first call anchors tick zero. Each intervening slot is drained in order, so a
    /// burst that jumps several ticks skips nothing. `on_fire` decides whether a fired key
    /// is dropped or rearmed. Returns how many entries fired.
    pub fn advance<F>(&mut self, timestamp: Duration, mut on_fire: F) -> Result<usize, WheelError>
    where
        F: FnMut(K) -> TimerAction,
    {
        let base = *self.base.get_or_insert(timestamp);
        let target = self.ticks_between(base, timestamp);
        let slots = self.slots.len() as u64;
        let mut fired = 0;

        while target > self.current_tick {
            if self.pending == 0 {
                self.current_tick = target;
                break;
            }

            let idx = (self.current_tick % slots) as usize;
            for entry in std::mem::take(&mut self.slots[idx]) {
                if entry.tick > self.current_tick {
                    self.slots[idx].push(entry);
                    continue;
                }

                self.pending -= 1;
                fired += 1;
                if let TimerAction::Rearm(at) = on_fire(entry.key) {
                    self.schedule(entry.key, at)?;
                }
            }
            self.current_tick += 1;
        }

        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn anchored(slots: usize) -> TimingWheel<u32> {
        let mut wheel = TimingWheel::new(slots, Duration::from_secs(1)).unwrap();
        wheel.advance(secs(0.0), |_| TimerAction::Release).unwrap();
        wheel
    }

    fn collect(wheel: &mut TimingWheel<u32>, at: f64) -> Vec<u32> {
        let mut fired = Vec::new();
        wheel
            .advance(secs(at), |key| {
                fired.push(key);
                TimerAction::Release
            })
            .unwrap();
        fired
    }

    #[test]
    fn rejects_empty_geometry() {
        assert!(matches!(
            TimingWheel::<u32>::new(0, Duration::from_secs(1)),
            Err(WheelError::InvalidGeometry(_))
        ));
        assert!(matches!(
            TimingWheel::<u32>::new(8, Duration::ZERO),
            Err(WheelError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn schedule_requires_anchor() {
        let mut wheel = TimingWheel::<u32>::new(8, Duration::from_secs(1)).unwrap();
        assert_eq!(wheel.schedule(1, secs(3.0)), Err(WheelError::Unanchored));
    }

    #[test]
    fn fires_once_after_target_tick() {
        let mut wheel = anchored(16);
        assert_eq!(wheel.schedule(7, secs(5.0)), Ok(5));

        assert!(collect(&mut wheel, 4.0).is_empty());
        assert!(collect(&mut wheel, 5.0).is_empty());
        assert_eq!(collect(&mut wheel, 6.0), vec![7]);
        assert!(collect(&mut wheel, 30.0).is_empty());
        assert!(wheel.is_empty());
    }

    #[test]
    fn horizon_is_enforced() {
        let mut wheel = anchored(4);
        assert_eq!(wheel.horizon(), Duration::from_secs(4));
        assert_eq!(wheel.schedule(1, secs(4.0)), Ok(4));
        assert_eq!(
            wheel.schedule(2, secs(5.0)),
            Err(WheelError::HorizonExceeded {
                tick: 5,
                current: 0,
                slots: 4
            })
        );
    }

    #[test]
    fn full_horizon_entry_does_not_fire_early() {
        let mut wheel = anchored(4);
        // Tick 4 lands in slot 0, the slot drained when leaving tick 0.
        wheel.schedule(9, secs(4.0)).unwrap();
        assert!(collect(&mut wheel, 1.0).is_empty());
        assert!(collect(&mut wheel, 4.5).is_empty());
        assert_eq!(collect(&mut wheel, 5.0), vec![9]);
    }

    #[test]
    fn past_due_expiry_waits_a_full_tick() {
        let mut wheel = TimingWheel::new(8, Duration::from_secs(1)).unwrap();
        wheel.advance(secs(10.0), |_| TimerAction::Release).unwrap();
        // Anchored at 10s; 3s maps before the anchor and is clamped to tick 1.
        assert_eq!(wheel.schedule(1u32, secs(3.0)), Ok(1));

        assert!(collect(&mut wheel, 11.0).is_empty());
        assert_eq!(collect(&mut wheel, 12.0), vec![1]);
    }

    #[test]
    fn burst_drains_every_intervening_slot() {
        let mut wheel = anchored(8);
        for (key, at) in [(1, 1.0), (2, 2.5), (3, 3.0), (4, 7.9)] {
            wheel.schedule(key, secs(at)).unwrap();
        }
        assert_eq!(collect(&mut wheel, 100.0), vec![1, 2, 3, 4]);
        assert_eq!(wheel.current_tick(), 100);
    }

    #[test]
    fn rearmed_keys_fire_again() {
        let mut wheel = anchored(8);
        wheel.schedule(5, secs(1.0)).unwrap();

        let mut rounds = 0;
        wheel
            .advance(secs(2.0), |_| {
                rounds += 1;
                TimerAction::Rearm(secs(4.0))
            })
            .unwrap();
        assert_eq!(rounds, 1);
        assert_eq!(wheel.len(), 1);

        assert!(collect(&mut wheel, 4.0).is_empty());
        assert_eq!(collect(&mut wheel, 5.0), vec![5]);
    }

    #[test]
    fn rearm_within_a_burst_fires_in_the_same_advance() {
        let mut wheel = anchored(8);
        wheel.schedule(1, secs(1.0)).unwrap();

        let mut seen = 0;
        let fired = wheel
            .advance(secs(6.0), |_| {
                seen += 1;
                if seen == 1 {
                    TimerAction::Rearm(secs(3.0))
                } else {
                    TimerAction::Release
                }
            })
            .unwrap();
        assert_eq!(fired, 2);
        assert!(wheel.is_empty());
    }

    #[test]
    fn tick_of_is_relative_to_first_timestamp() {
        let mut wheel = TimingWheel::<u32>::new(8, Duration::from_millis(100)).unwrap();
        assert_eq!(wheel.tick_of(secs(5.0)), None);
        wheel.advance(secs(1000.0), |_| TimerAction::Release).unwrap();
        assert_eq!(wheel.tick_of(secs(1000.25)), Some(2));
        assert_eq!(wheel.tick_of(secs(999.0)), Some(0));
    }
}
