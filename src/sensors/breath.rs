//! Breath sampling pipeline: fixed ring buffer, periodic sampler, averager.
//!
//! ```text
//!  sample clock ──▶ AnalogSampler::tick ──▶ SampleBuffer ──▶ Averager
//!   (1 s)           N conversions,           10 slots,        mean of all
//!                   last valid wins          cursor wraps     slots
//! ```
//!
//! The buffer is pre-filled with zeros and always holds exactly `N`
//! entries, so the average ramps up over the first `N` ticks of a session.

use crate::app::ports::SensorConversion;
use crate::error::SensorFault;

/// Largest value a 12-bit conversion can produce.
pub const ADC_MAX: u16 = 4095;

/// Slots in the breath ring buffer.
pub const SAMPLE_CAPACITY: usize = 10;

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring of raw samples. The oldest entry is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer<const N: usize> {
    slots: [u16; N],
    cursor: usize,
}

impl<const N: usize> Default for SampleBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleBuffer<N> {
    pub const fn new() -> Self {
        Self {
            slots: [0; N],
            cursor: 0,
        }
    }

    /// Overwrite the slot under the cursor without moving it.
    pub fn write_current(&mut self, raw: u16) {
        self.slots[self.cursor] = raw;
    }

    /// Move the cursor one slot forward, wrapping at `N`.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % N;
    }

    /// Rewind the cursor to slot 0. Contents are kept.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.slots
    }

    /// Integer-truncated mean of every slot.
    pub fn mean(&self) -> u16 {
        let sum: u32 = self.slots.iter().map(|&s| u32::from(s)).sum();
        (sum / N as u32) as u16
    }
}

// ---------------------------------------------------------------------------
// AnalogSampler
// ---------------------------------------------------------------------------

/// Result of one sample-clock tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleTick {
    /// Value stored in the slot, if any conversion was valid.
    pub stored: Option<u16>,
    /// Last rejected conversion, if any.
    pub fault: Option<SensorFault>,
}

/// Runs the per-tick conversions and fills the ring buffer.
#[derive(Debug, Default)]
pub struct AnalogSampler {
    buffer: SampleBuffer<SAMPLE_CAPACITY>,
    conversions: u8,
    total_ticks: u32,
}

impl AnalogSampler {
    pub fn new(conversions_per_tick: u8) -> Self {
        Self {
            buffer: SampleBuffer::new(),
            conversions: conversions_per_tick.max(1),
            total_ticks: 0,
        }
    }

    /// One sample-clock tick: trigger the conversions, store the last
    /// valid reading in the current slot, then advance the cursor by one.
    ///
    /// Readings above [`ADC_MAX`] are rejected and leave the slot as it
    /// was; the cursor still advances.
    pub fn tick(&mut self, source: &mut impl SensorConversion) -> SampleTick {
        let mut outcome = SampleTick::default();

        for _ in 0..self.conversions {
            let raw = source.convert();
            if raw > ADC_MAX {
                outcome.fault = Some(SensorFault::OutOfRange { raw });
                continue;
            }
            self.buffer.write_current(raw);
            outcome.stored = Some(raw);
        }

        self.buffer.advance();
        self.total_ticks = self.total_ticks.saturating_add(1);
        outcome
    }

    /// Restart the cadence from slot 0 (buffer contents are kept).
    pub fn restart(&mut self) {
        self.buffer.rewind();
    }

    pub fn buffer(&self) -> &SampleBuffer<SAMPLE_CAPACITY> {
        &self.buffer
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }
}

// ---------------------------------------------------------------------------
// Averager
// ---------------------------------------------------------------------------

/// Holds the most recent mean of the sample buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Averager {
    latest: u16,
}

impl Averager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the mean. Never blocks; cost is one pass over the buffer.
    pub fn update<const N: usize>(&mut self, buffer: &SampleBuffer<N>) -> u16 {
        self.latest = buffer.mean();
        self.latest
    }

    pub fn latest(&self) -> u16 {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed script of conversion results.
    struct Script<'a> {
        values: &'a [u16],
        next: usize,
    }

    impl<'a> Script<'a> {
        fn new(values: &'a [u16]) -> Self {
            Self { values, next: 0 }
        }
    }

    impl SensorConversion for Script<'_> {
        fn convert(&mut self) -> u16 {
            let v = self.values[self.next % self.values.len()];
            self.next += 1;
            v
        }
    }

    #[test]
    fn buffer_starts_zeroed() {
        let buf = SampleBuffer::<10>::new();
        assert_eq!(buf.as_slice(), &[0; 10]);
        assert_eq!(buf.mean(), 0);
    }

    #[test]
    fn cursor_wraps_after_capacity() {
        let mut buf = SampleBuffer::<3>::new();
        for _ in 0..3 {
            buf.advance();
        }
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn mean_truncates() {
        let mut buf = SampleBuffer::<3>::new();
        for v in [1, 1, 2] {
            buf.write_current(v);
            buf.advance();
        }
        assert_eq!(buf.mean(), 1);
    }

    #[test]
    fn last_valid_conversion_wins() {
        let mut sampler = AnalogSampler::new(2);
        let mut src = Script::new(&[100, 200]);
        let tick = sampler.tick(&mut src);
        assert_eq!(tick.stored, Some(200));
        assert_eq!(sampler.buffer().as_slice()[0], 200);
        assert_eq!(sampler.buffer().cursor(), 1);
    }

    #[test]
    fn out_of_range_is_skipped_and_cursor_still_moves() {
        let mut sampler = AnalogSampler::new(2);
        let mut src = Script::new(&[300, 5000]);
        let tick = sampler.tick(&mut src);
        assert_eq!(tick.stored, Some(300));
        assert_eq!(tick.fault, Some(SensorFault::OutOfRange { raw: 5000 }));
        assert_eq!(sampler.buffer().as_slice()[0], 300);

        let mut bad = Script::new(&[4096]);
        let tick = sampler.tick(&mut bad);
        assert_eq!(tick.stored, None);
        assert_eq!(sampler.buffer().as_slice()[1], 0);
        assert_eq!(sampler.buffer().cursor(), 2);
    }

    #[test]
    fn restart_rewinds_but_keeps_contents() {
        let mut sampler = AnalogSampler::new(1);
        let mut src = Script::new(&[4095]);
        for _ in 0..4 {
            sampler.tick(&mut src);
        }
        sampler.restart();
        assert_eq!(sampler.buffer().cursor(), 0);
        assert_eq!(sampler.buffer().as_slice()[3], 4095);
    }

    #[test]
    fn averager_ramps_with_buffer() {
        let mut sampler = AnalogSampler::new(2);
        let mut avg = Averager::new();
        let mut src = Script::new(&[4000]);
        for i in 1..=10u16 {
            sampler.tick(&mut src);
            assert_eq!(avg.update(sampler.buffer()), 4000 * i / 10);
        }
        assert_eq!(avg.latest(), 4000);
    }
}
