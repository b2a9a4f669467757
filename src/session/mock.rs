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
use std::collections::HashSet;

use super::{Record, Section, SessionDocument, SessionError};

/// An in-memory session. Records what was written to it.
#[derive(Debug, Clone)]
pub struct Session {
    sample_rate: u32,
    id_counter: u64,
    sections: HashSet<Section>,
    /// Marker flags of pre-existing locations, true for markers.
    locations: Vec<bool>,
    records: Vec<Record>,
    persisted: Option<Vec<Record>>,
}

impl Session {
    /// A session with both sections present and no content.
    pub fn new(sample_rate: u32, id_counter: u64) -> Session {
        Session {
            sample_rate,
            id_counter,
            sections: HashSet::from([Section::TempoMap, Section::Locations]),
            locations: Vec::new(),
            records: Vec::new(),
            persisted: None,
        }
    }

    /// Drops the given section, as if the session file never had one.
    pub fn without(mut self, section: Section) -> Session {
        self.sections.remove(&section);
        self
    }

    /// Adds pre-existing locations: `markers` markers and `others` ranges.
    pub fn with_locations(mut self, markers: usize, others: usize) -> Session {
        self.locations.extend(std::iter::repeat(true).take(markers));
        self.locations.extend(std::iter::repeat(false).take(others));
        self
    }

    /// Records appended so far.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records as of the last persist, if persisted.
    pub fn persisted(&self) -> Option<&[Record]> {
        self.persisted.as_deref()
    }

    /// Remaining pre-existing locations that are not markers.
    pub fn other_locations(&self) -> usize {
        self.locations.iter().filter(|marker| !**marker).count()
    }

    pub fn id_counter(&self) -> u64 {
        self.id_counter
    }
}

impl SessionDocument for Session {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn find_section(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    fn remove_section(&mut self, section: Section) -> Result<(), SessionError> {
        if !self.sections.remove(&section) {
            return Err(SessionError::MissingSection(section));
        }
        self.records.retain(|record| record.section() != section);
        if section == Section::Locations {
            self.locations.clear();
        }
        Ok(())
    }

    fn insert_section(&mut self, section: Section) -> Result<(), SessionError> {
        self.sections.insert(section);
        Ok(())
    }

    fn remove_markers(&mut self) -> Result<usize, SessionError> {
        if !self.find_section(Section::Locations) {
            return Err(SessionError::MissingSection(Section::Locations));
        }
        let before = self.locations.len() + self.records.len();
        self.locations.retain(|marker| !marker);
        self.records.retain(|record| !matches!(record, Record::Marker(_)));
        Ok(before - self.locations.len() - self.records.len())
    }

    fn append_child(&mut self, record: Record) -> Result<(), SessionError> {
        if !self.find_section(record.section()) {
            return Err(SessionError::MissingSection(record.section()));
        }
        self.records.push(record);
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.id_counter;
        self.id_counter += 1;
        id
    }

    fn persist(&mut self) -> Result<(), SessionError> {
        self.persisted = Some(self.records.clone());
        Ok(())
    }
}
