// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::fmt;

use crate::tempomap::{Meter, TempomapEntry};

mod converter;

pub use converter::{ConversionSummary, ConvertError, TimelineConverter};

/// A musical position on the timeline, zero-based internally. Displayed in
/// the session's 1-based `bar|beat|tick` form with ticks always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub bar: u32,
    pub beat: u32,
}

impl Position {
    pub fn new(bar: u32, beat: u32) -> Self {
        Position { bar, beat }
    }

    /// Position of the first beat of the given bar.
    pub fn bar_start(bar: u32) -> Self {
        Position::new(bar, 0)
    }

    /// The very start of the timeline.
    pub fn is_origin(&self) -> bool {
        self.bar == 0 && self.beat == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|0",
            u64::from(self.bar) + 1,
            u64::from(self.beat) + 1
        )
    }
}

/// Logarithmic mean of two tempos: the average rate when tempo varies
/// exponentially between them. Falls back to the arithmetic mean when the
/// two are within a relative 1e-9 of each other.
pub fn log_mean(a: f64, b: f64) -> f64 {
    // ln(a) - ln(b) cancels for nearby values, so take ln(1 + (a - b) / b).
    let x = (a - b) / b;
    if x.abs() < 1e-9 {
        return (a + b) / 2.0;
    }
    (a - b) / x.ln_1p()
}

/// The tempo that yields the entry's duration when held constant.
pub fn effective_tempo(entry: &TempomapEntry) -> f64 {
    match entry.tempo2 {
        Some(tempo2) => log_mean(entry.tempo, tempo2),
        None => entry.tempo,
    }
}

/// Duration of the entry in seconds.
pub fn entry_seconds(entry: &TempomapEntry) -> f64 {
    entry.beat_count() as f64 * 240.0 / (effective_tempo(entry) * entry.denom as f64)
}

/// Duration of the entry in samples at the given sample rate, unrounded.
pub fn entry_frames(entry: &TempomapEntry, sample_rate: u32) -> f64 {
    entry_seconds(entry) * sample_rate as f64
}

/// Average tempo of one beat inside a ramp. Beat boundaries are interpolated
/// linearly across the entry's beats and averaged with the logarithmic mean.
pub fn beat_tempo(entry: &TempomapEntry, beat: u32) -> f64 {
    let tempo2 = entry.tempo2.unwrap_or(entry.tempo);
    let delta = tempo2 - entry.tempo;
    let n = entry.beat_count() as f64;
    let t1 = entry.tempo + delta * beat as f64 / n;
    let t2 = entry.tempo + delta * (beat + 1) as f64 / n;
    log_mean(t1, t2)
}

/// Per-beat staircase approximating the ramp of an entry, with the position
/// of each step relative to the entry's first bar.
pub fn ramp_steps(entry: &TempomapEntry) -> impl Iterator<Item = (Position, f64)> + '_ {
    (0..entry.beat_count()).map(move |beat| {
        (
            Position::new(beat / entry.beats, beat % entry.beats),
            beat_tempo(entry, beat),
        )
    })
}

/// Running position, meter and tempo while walking a tempo map.
///
/// A `None` meter or tempo means nothing is known yet, which forces the next
/// entry to emit a point. Tempo also goes back to `None` after a ramp, since
/// the ramp ends on its last step rather than on a nominal tempo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConversionState {
    /// Elapsed samples from the start of the timeline.
    pub frames: f64,
    /// Elapsed bars from the start of the timeline.
    pub bars: u32,
    pub meter: Option<Meter>,
    pub tempo: Option<f64>,
}

impl ConversionState {
    /// The state at the start of the timeline.
    pub fn start() -> Self {
        ConversionState::default()
    }

    /// Returns the state after the given entry, which took `frames` samples,
    /// or `None` if the bar count no longer fits.
    pub fn advance(&self, entry: &TempomapEntry, frames: f64) -> Option<ConversionState> {
        Some(ConversionState {
            frames: self.frames + frames,
            bars: self.bars.checked_add(entry.bars)?,
            meter: Some(entry.meter()),
            tempo: if entry.is_ramp() {
                None
            } else {
                Some(entry.tempo)
            },
        })
    }

    /// Whether the entry needs its own constant tempo point.
    pub fn needs_tempo(&self, entry: &TempomapEntry) -> bool {
        !entry.is_ramp() && self.tempo != Some(entry.tempo)
    }

    /// Whether the entry changes the meter.
    pub fn needs_meter(&self, entry: &TempomapEntry) -> bool {
        self.meter != Some(entry.meter())
    }

    /// Marker position in whole samples.
    pub fn sample(&self) -> u64 {
        self.frames.round() as u64
    }
}

#[cfg(test)]
mod test {
    use crate::tempomap::{Meter, TempomapEntry};

    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_position_display() {
        assert_eq!("1|1|0", Position::new(0, 0).to_string());
        assert_eq!("5|3|0", Position::new(4, 2).to_string());
        assert_eq!("13|1|0", Position::bar_start(12).to_string());
        assert!(Position::new(0, 0).is_origin());
        assert!(!Position::new(0, 1).is_origin());
        assert!(!Position::new(1, 0).is_origin());
        assert_eq!("4294967296|1|0", Position::bar_start(u32::MAX).to_string());
    }

    #[test]
    fn test_log_mean_symmetric() {
        for (a, b) in [(140.0, 160.0), (60.0, 200.0), (120.0, 90.5), (1.0, 2.0)] {
            let ab = log_mean(a, b);
            let ba = log_mean(b, a);
            assert!((ab - ba).abs() < EPSILON, "{} != {}", ab, ba);
            assert!(ab > a.min(b) && ab < a.max(b));
        }
    }

    #[test]
    fn test_log_mean_equal_bounds() {
        assert_eq!(120.0, log_mean(120.0, 120.0));
        assert_eq!(0.5, log_mean(0.5, 0.5));
        assert!(log_mean(100.0, 100.0 + 1e-14).is_finite());
    }

    #[test]
    fn test_log_mean_nearly_equal() {
        for a in [100.0_f64, 120.0, 0.5, 333.3] {
            for k in 1..8 {
                let b = f64::from_bits(a.to_bits() + k);
                for (x, y) in [(a, b), (b, a)] {
                    let mean = log_mean(x, y);
                    assert!(mean.is_finite(), "log_mean({}, {}) = {}", x, y, mean);
                    assert!(mean >= a && mean <= b, "log_mean({}, {}) = {}", x, y, mean);
                }
            }
        }
    }

    #[test]
    fn test_nearly_flat_ramp_frames() {
        let entries = crate::tempomap::parse_tempomap("1 100-100.00000000000003\n").unwrap();
        let constant = entry_frames(&TempomapEntry::new(1, 100.0), 48000);
        assert!((constant - 115200.0).abs() < 1e-6);
        assert!((entry_frames(&entries[0], 48000) - constant).abs() < 1e-6);
        assert!(ramp_steps(&entries[0]).all(|(_, tempo)| tempo.is_finite()));
    }

    #[test]
    fn test_constant_entry_frames() {
        let entry = TempomapEntry::new(4, 120.0).with_meter(3, 4);
        // 4 * 3 * 240 / (120 * 4) = 6 seconds.
        assert_eq!(6.0, entry_seconds(&entry));
        assert_eq!(4.0 * 3.0 * 240.0 / (120.0 * 4.0) * 48000.0, entry_frames(&entry, 48000));

        let eighths = TempomapEntry::new(2, 90.0).with_meter(6, 8);
        assert_eq!(2.0 * 6.0 * 240.0 / (90.0 * 8.0) * 44100.0, entry_frames(&eighths, 44100));
    }

    #[test]
    fn test_ramp_entry_frames() {
        let entry = TempomapEntry::new(8, 140.0).with_ramp(160.0);
        let t_eff = (140.0 - 160.0) / (140.0_f64.ln() - 160.0_f64.ln());
        assert!((effective_tempo(&entry) - t_eff).abs() < EPSILON);

        let expected = 8.0 * 4.0 * 240.0 / (t_eff * 4.0) * 48000.0;
        assert!((entry_frames(&entry, 48000) - expected).abs() < 1e-6);

        // Faster than the start tempo alone, slower than the target alone.
        let at_start = entry_frames(&TempomapEntry::new(8, 140.0), 48000);
        let at_end = entry_frames(&TempomapEntry::new(8, 160.0), 48000);
        assert!(entry_frames(&entry, 48000) < at_start);
        assert!(entry_frames(&entry, 48000) > at_end);
    }

    #[test]
    fn test_flat_ramp_matches_constant() {
        let ramp = TempomapEntry::new(2, 100.0).with_ramp(100.0);
        let constant = TempomapEntry::new(2, 100.0);
        assert_eq!(entry_frames(&constant, 48000), entry_frames(&ramp, 48000));
        assert!(ramp_steps(&ramp).all(|(_, tempo)| tempo == 100.0));
    }

    #[test]
    fn test_ramp_steps_increasing() {
        let entry = TempomapEntry::new(8, 140.0).with_meter(3, 4).with_ramp(160.0);
        let steps: Vec<(Position, f64)> = ramp_steps(&entry).collect();

        assert_eq!(24, steps.len());
        assert_eq!(Position::new(0, 0), steps[0].0);
        assert_eq!(Position::new(0, 2), steps[2].0);
        assert_eq!(Position::new(1, 0), steps[3].0);
        assert_eq!(Position::new(7, 2), steps[23].0);

        assert!(steps[0].1 > 140.0);
        assert!(steps[23].1 < 160.0);
        for pair in steps.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "{} > {}", pair[0].1, pair[1].1);
        }
    }

    #[test]
    fn test_ramp_steps_decreasing() {
        let entry = TempomapEntry::new(2, 180.0).with_ramp(60.0);
        let tempos: Vec<f64> = ramp_steps(&entry).map(|(_, tempo)| tempo).collect();

        assert_eq!(8, tempos.len());
        assert!(tempos[0] < 180.0);
        assert!(tempos[7] > 60.0);
        for pair in tempos.windows(2) {
            assert!(pair[0] >= pair[1], "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_beat_tempo_matches_formula() {
        let entry = TempomapEntry::new(1, 100.0).with_ramp(200.0);
        // Beat 1 of 4 runs from 125 to 150.
        let expected = (125.0 - 150.0) / (125.0_f64.ln() - 150.0_f64.ln());
        assert!((beat_tempo(&entry, 1) - expected).abs() < EPSILON);
    }

    #[test]
    fn test_state_advance() {
        let start = ConversionState::start();
        assert_eq!(0.0, start.frames);
        assert_eq!(0, start.bars);
        assert_eq!(None, start.meter);
        assert_eq!(None, start.tempo);

        let constant = TempomapEntry::new(4, 120.0).with_meter(3, 4);
        assert!(start.needs_tempo(&constant));
        assert!(start.needs_meter(&constant));

        let state = start.advance(&constant, 86400.0).unwrap();
        assert_eq!(86400.0, state.frames);
        assert_eq!(4, state.bars);
        assert_eq!(Some(Meter::new(3, 4)), state.meter);
        assert_eq!(Some(120.0), state.tempo);
        assert_eq!(86400, state.sample());

        assert!(!state.needs_tempo(&TempomapEntry::new(2, 120.0).with_meter(3, 4)));
        assert!(!state.needs_meter(&TempomapEntry::new(2, 90.0).with_meter(3, 4)));
        assert!(state.needs_meter(&TempomapEntry::new(2, 90.0)));

        let ramp = TempomapEntry::new(2, 120.0).with_ramp(140.0);
        assert!(!state.needs_tempo(&ramp));
        let state = state.advance(&ramp, 1000.5).unwrap();
        assert_eq!(None, state.tempo);
        assert_eq!(6, state.bars);
        assert_eq!(87401, state.sample());

        // After a ramp, even a numerically equal tempo is emitted again.
        assert!(state.needs_tempo(&TempomapEntry::new(1, 120.0)));
    }

    #[test]
    fn test_state_advance_overflow() {
        let long = TempomapEntry::new(u32::MAX, 120.0).with_meter(1, 1);
        let state = ConversionState::start().advance(&long, 0.0).unwrap();
        assert_eq!(u32::MAX, state.bars);
        assert_eq!(None, state.advance(&TempomapEntry::new(1, 120.0), 0.0));
    }
}
