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

use crate::timeline::Position;

mod ardour;
mod error;
#[cfg(test)]
pub mod mock;
pub mod xml;

pub use ardour::ArdourSession;
pub use error::SessionError;

/// A section of the session document the converter rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    TempoMap,
    Locations,
}

impl Section {
    /// The element name of the section in the session file.
    pub fn element_name(&self) -> &'static str {
        match self {
            Section::TempoMap => "TempoMap",
            Section::Locations => "Locations",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A tempo change.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoPoint {
    pub start: Position,
    pub beats_per_minute: f64,
    pub note_type: u32,
    pub movable: bool,
}

/// A meter change. Always starts on the first beat of a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterPoint {
    pub start: Position,
    pub beats_per_bar: u32,
    pub note_type: u32,
    pub movable: bool,
}

/// A named, zero-length location.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: u64,
    pub name: String,
    pub sample: u64,
    pub locked: bool,
}

/// A record written into the session. Records are never read back.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Tempo(TempoPoint),
    Meter(MeterPoint),
    Marker(Marker),
}

impl Record {
    /// The section the record belongs to.
    pub fn section(&self) -> Section {
        match self {
            Record::Tempo(_) | Record::Meter(_) => Section::TempoMap,
            Record::Marker(_) => Section::Locations,
        }
    }
}

/// A session document that the timeline converter rewrites.
pub trait SessionDocument {
    /// The sample rate of the session.
    fn sample_rate(&self) -> u32;

    /// Returns true if the section exists.
    fn find_section(&self, section: Section) -> bool;

    /// Removes the section and everything in it.
    fn remove_section(&mut self, section: Section) -> Result<(), SessionError>;

    /// Adds an empty section, in the place of a previously removed one if any.
    fn insert_section(&mut self, section: Section) -> Result<(), SessionError>;

    /// Removes marker locations, leaving every other kind of location alone.
    /// Returns the number of markers removed.
    fn remove_markers(&mut self) -> Result<usize, SessionError>;

    /// Appends the record to the end of its section.
    fn append_child(&mut self, record: Record) -> Result<(), SessionError>;

    /// Allocates the next object ID from the session's counter.
    fn allocate_id(&mut self) -> u64;

    /// Writes all changes out.
    fn persist(&mut self) -> Result<(), SessionError>;
}
