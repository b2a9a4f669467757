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

use tracing::{debug, info};

use crate::config::Settings;
use crate::session::{
    Marker, MeterPoint, Record, Section, SessionDocument, SessionError, TempoPoint,
};
use crate::tempomap::TempomapEntry;

use super::{entry_frames, ramp_steps, ConversionState, Position};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("session sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("line {line_number}: timeline exceeds {max} bars", max = u32::MAX)]
    TimelineTooLong { line_number: usize },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Counts of what a conversion wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub tempo_points: usize,
    pub meter_points: usize,
    pub markers: usize,
    /// Markers that were in the session beforehand and got replaced.
    pub removed_markers: usize,
    /// Length of the whole tempo map in samples.
    pub frames: u64,
}

/// Writes a tempo map into a session document, replacing its tempo map and
/// markers.
pub struct TimelineConverter<'a, D: SessionDocument + ?Sized> {
    session: &'a mut D,
    sample_rate: u32,
    tempo_note_type: u32,
    lock_markers: bool,
}

impl<'a, D: SessionDocument + ?Sized> TimelineConverter<'a, D> {
    pub fn new(session: &'a mut D, settings: &Settings) -> Self {
        let sample_rate = session.sample_rate();
        TimelineConverter {
            session,
            sample_rate,
            tempo_note_type: settings.tempo_note_type,
            lock_markers: settings.lock_markers,
        }
    }

    /// Converts the entries and persists the session.
    pub fn write(mut self, entries: &[TempomapEntry]) -> Result<ConversionSummary, ConvertError> {
        let summary = self.emit(entries)?;
        self.session.persist()?;
        Ok(summary)
    }

    /// Converts the entries into the in-memory session without persisting.
    pub fn emit(&mut self, entries: &[TempomapEntry]) -> Result<ConversionSummary, ConvertError> {
        if self.sample_rate == 0 {
            return Err(ConvertError::InvalidSampleRate);
        }

        let mut summary = ConversionSummary {
            removed_markers: self.clear()?,
            ..Default::default()
        };

        let mut state = ConversionState::start();
        for entry in entries {
            let next = state
                .advance(entry, entry_frames(entry, self.sample_rate))
                .ok_or(ConvertError::TimelineTooLong {
                    line_number: entry.line,
                })?;
            self.emit_entry(&state, entry, &mut summary)?;
            state = next;
        }
        summary.frames = state.sample();

        info!(
            tempo_points = summary.tempo_points,
            meter_points = summary.meter_points,
            markers = summary.markers,
            removed_markers = summary.removed_markers,
            bars = state.bars,
            frames = summary.frames,
            "Converted tempo map"
        );
        Ok(summary)
    }

    /// Drops the existing tempo map and markers. Returns the number of
    /// markers removed.
    fn clear(&mut self) -> Result<usize, ConvertError> {
        self.session.remove_section(Section::TempoMap)?;
        self.session.insert_section(Section::TempoMap)?;

        if !self.session.find_section(Section::Locations) {
            return Err(SessionError::MissingSection(Section::Locations).into());
        }
        Ok(self.session.remove_markers()?)
    }

    fn emit_entry(
        &mut self,
        state: &ConversionState,
        entry: &TempomapEntry,
        summary: &mut ConversionSummary,
    ) -> Result<(), ConvertError> {
        if state.needs_tempo(entry) {
            self.tempo(Position::bar_start(state.bars), entry.tempo)?;
            summary.tempo_points += 1;
        } else if entry.is_ramp() {
            for (offset, tempo) in ramp_steps(entry) {
                self.tempo(Position::new(state.bars + offset.bar, offset.beat), tempo)?;
                summary.tempo_points += 1;
            }
        }

        if state.needs_meter(entry) {
            let start = Position::bar_start(state.bars);
            debug!(%start, meter = %entry.meter(), "Meter");
            self.session.append_child(Record::Meter(MeterPoint {
                start,
                beats_per_bar: entry.beats,
                note_type: entry.denom,
                movable: !start.is_origin(),
            }))?;
            summary.meter_points += 1;
        }

        if let Some(label) = &entry.label {
            let id = self.session.allocate_id();
            debug!(label = %label, sample = state.sample(), id, "Marker");
            self.session.append_child(Record::Marker(Marker {
                id,
                name: label.clone(),
                sample: state.sample(),
                locked: self.lock_markers,
            }))?;
            summary.markers += 1;
        }

        Ok(())
    }

    fn tempo(&mut self, start: Position, beats_per_minute: f64) -> Result<(), SessionError> {
        debug!(%start, beats_per_minute, "Tempo");
        self.session.append_child(Record::Tempo(TempoPoint {
            start,
            beats_per_minute,
            note_type: self.tempo_note_type,
            movable: !start.is_origin(),
        }))
    }
}
