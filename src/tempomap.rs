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
mod error;
mod grammar;
mod parser;

use std::fmt;

pub use error::TempomapError;
pub use parser::{parse_tempomap, read_tempomap};

/// A meter: beats per bar over the beat unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meter {
    pub beats: u32,
    pub denom: u32,
}

impl Meter {
    pub fn new(beats: u32, denom: u32) -> Self {
        Meter { beats, denom }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter::new(4, 4)
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.denom)
    }
}

/// One line of a tempo map: a run of bars at a fixed meter, either at a
/// constant tempo or ramping from `tempo` to `tempo2`.
#[derive(Debug, Clone, PartialEq)]
pub struct TempomapEntry {
    /// Marker name placed at the start of the entry.
    pub label: Option<String>,
    /// Number of bars the entry spans.
    pub bars: u32,
    /// Beats per bar.
    pub beats: u32,
    /// Beat unit.
    pub denom: u32,
    /// Starting tempo in beats per minute.
    pub tempo: f64,
    /// Ending tempo of a ramp. `None` for a constant tempo.
    pub tempo2: Option<f64>,
    /// Click accent pattern. Parsed for compatibility, not converted.
    pub pattern: Option<String>,
    /// Click volume. Parsed for compatibility, not converted.
    pub volume: Option<f64>,
    /// Source line number (1-based), zero for entries built in code.
    pub line: usize,
}

impl TempomapEntry {
    /// Creates a constant-tempo 4/4 entry.
    pub fn new(bars: u32, tempo: f64) -> Self {
        let meter = Meter::default();
        TempomapEntry {
            label: None,
            bars,
            beats: meter.beats,
            denom: meter.denom,
            tempo,
            tempo2: None,
            pattern: None,
            volume: None,
            line: 0,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_meter(mut self, beats: u32, denom: u32) -> Self {
        self.beats = beats;
        self.denom = denom;
        self
    }

    pub fn with_ramp(mut self, tempo2: f64) -> Self {
        self.tempo2 = Some(tempo2);
        self
    }

    pub fn meter(&self) -> Meter {
        Meter::new(self.beats, self.denom)
    }

    /// Whether this entry describes a gradual tempo change.
    pub fn is_ramp(&self) -> bool {
        self.tempo2.is_some()
    }

    /// Total number of beats across all bars of the entry.
    pub fn beat_count(&self) -> u32 {
        self.bars * self.beats
    }
}
