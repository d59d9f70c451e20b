use binary_heap_plus::{BinaryHeap, MinComparator};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub};

const EVENT_CAPACITY: usize = 16;

/// Drives all emulation-time related events and governs the current time.
///
/// The CPU reports the cycles it consumed through [`Scheduler::add_time`];
/// anyone else schedules events at absolute or relative timestamps and the
/// emulator loop drains everything that has become due.
#[derive(Debug)]
pub struct Scheduler {
    /// The current emulation time, expressed in clock cycles.
    pub current_time: EmuTime,
    event_queue: BinaryHeap<Event, MinComparator>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            current_time: EmuTime(0),
            event_queue: BinaryHeap::with_capacity_min(EVENT_CAPACITY),
        }
    }

    /// Pop an event that is due at, or before, the current time.
    ///
    /// Returns [`None`] once all due events have been drained.
    #[inline]
    pub fn pop_current(&mut self) -> Option<Event> {
        if self
            .event_queue
            .peek()
            .map_or(false, |ev| ev.timestamp <= self.current_time)
        {
            self.event_queue.pop()
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn add_time(&mut self, cycles: u32) {
        self.current_time.0 += cycles as u64;
    }

    /// Schedule the provided event at the absolute time `when`.
    #[inline(always)]
    #[profiling::function]
    pub fn schedule_event(&mut self, tag: EventTag, when: EmuTime) {
        self.event_queue.push(Event { tag, timestamp: when });
    }

    /// Schedule the provided event at `current_time + offset`.
    pub fn schedule_relative(&mut self, tag: EventTag, offset: EmuTime) {
        self.schedule_event(tag, self.current_time + offset);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum EventTag {
    /// Shouldn't ever be reached, but will ensure the emulator will exit correctly.
    Exit,

    /// The PPU entered the VBlank period (scanline 160).
    VBlank,
    /// The visible part of a scanline ended.
    HBlank,
    /// A full scanline (draw + HBlank) elapsed.
    HBlankEnd,
}

#[derive(Debug, Copy, Clone, Eq)]
pub struct Event {
    pub tag: EventTag,
    pub timestamp: EmuTime,
}

impl Default for Event {
    fn default() -> Self {
        Event {
            tag: EventTag::Exit,
            timestamp: EmuTime(u64::MAX),
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp.cmp(&other.timestamp)
    }
}

/// A certain point in time, expressed in emulator clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
#[repr(transparent)]
pub struct EmuTime(pub u64);

impl From<u64> for EmuTime {
    fn from(time: u64) -> Self {
        EmuTime(time)
    }
}

impl From<u32> for EmuTime {
    fn from(time: u32) -> Self {
        EmuTime(time as u64)
    }
}

impl Add<EmuTime> for EmuTime {
    type Output = EmuTime;

    fn add(self, rhs: EmuTime) -> Self::Output {
        EmuTime(self.0 + rhs.0)
    }
}

impl AddAssign<EmuTime> for EmuTime {
    fn add_assign(&mut self, rhs: EmuTime) {
        self.0 += rhs.0;
    }
}

impl Sub<EmuTime> for EmuTime {
    type Output = EmuTime;

    fn sub(self, rhs: EmuTime) -> Self::Output {
        EmuTime(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::scheduler::{EmuTime, Event, EventTag, Scheduler};

    #[test]
    fn empty_scheduler_is_idle() {
        let mut scheduler = Scheduler::new();

        assert!(scheduler.pop_current().is_none());
        assert_eq!(scheduler.current_time, EmuTime(0));
    }

    #[test]
    fn events_fire_once_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_event(EventTag::HBlank, EmuTime(10));

        // Not due yet.
        assert!(scheduler.pop_current().is_none());

        scheduler.add_time(9);
        assert!(scheduler.pop_current().is_none());

        scheduler.add_time(1);
        assert_eq!(
            scheduler.pop_current(),
            Some(Event {
                tag: EventTag::HBlank,
                timestamp: EmuTime(10),
            })
        );
        assert!(scheduler.pop_current().is_none());
    }

    #[test]
    fn events_drain_in_timestamp_order() {
        let mut scheduler = Scheduler::new();

        scheduler.schedule_event(EventTag::HBlank, EmuTime(10));
        scheduler.schedule_event(EventTag::VBlank, EmuTime(0));
        scheduler.schedule_relative(EventTag::HBlankEnd, EmuTime(15));

        scheduler.add_time(20);

        let drained: Vec<_> = std::iter::from_fn(|| scheduler.pop_current()).map(|e| e.tag).collect();
        assert_eq!(drained, vec![EventTag::VBlank, EventTag::HBlank, EventTag::HBlankEnd]);
    }
}
