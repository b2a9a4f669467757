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

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::xml::{self, Element};
use super::{Marker, MeterPoint, Record, Section, SessionDocument, SessionError, TempoPoint};

const SAMPLE_RATE: &str = "sample-rate";
const ID_COUNTER: &str = "id-counter";
const MARKER_FLAG: &str = "IsMark";

/// An Ardour session file held in memory.
pub struct ArdourSession {
    /// Where `persist` writes the session.
    output: PathBuf,
    root: Element,
    sample_rate: u32,
    id_counter: u64,
    /// Child index of removed sections, so they are re-created in place.
    removed: HashMap<Section, usize>,
}

impl ArdourSession {
    /// Opens the session file at the given path. Changes are persisted back
    /// to the same file unless `save_as` is called.
    pub fn open(path: &Path) -> Result<ArdourSession, SessionError> {
        debug!(path = %path.display(), "Opening session");
        let content = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ArdourSession::from_xml(&content, path.to_path_buf())
    }

    /// Loads a session from XML text.
    pub fn from_xml(content: &str, output: PathBuf) -> Result<ArdourSession, SessionError> {
        let root = xml::parse(content)?;
        let sample_rate = parse_attribute(&root, SAMPLE_RATE)?;
        let id_counter = parse_attribute(&root, ID_COUNTER)?;

        Ok(ArdourSession {
            output,
            root,
            sample_rate,
            id_counter,
            removed: HashMap::new(),
        })
    }

    /// Persists to a different path than the one the session was opened from.
    pub fn save_as(&mut self, path: &Path) {
        self.output = path.to_path_buf();
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Serializes the session, including the current ID counter.
    pub fn to_xml(&mut self) -> Result<Vec<u8>, SessionError> {
        self.root.set_attribute(ID_COUNTER, self.id_counter);
        xml::write(&self.root)
    }

    fn section_mut(&mut self, section: Section) -> Result<&mut Element, SessionError> {
        self.root
            .find_mut(section.element_name())
            .ok_or(SessionError::MissingSection(section))
    }
}

fn parse_attribute<T>(element: &Element, name: &str) -> Result<T, SessionError>
where
    T: std::str::FromStr,
{
    let value = element
        .attribute(name)
        .ok_or_else(|| SessionError::MissingAttribute {
            element: element.name.clone(),
            attribute: name.to_string(),
        })?;
    value.parse().map_err(|_| SessionError::InvalidAttribute {
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn is_marker(location: &Element) -> bool {
    location
        .attribute("flags")
        .is_some_and(|flags| flags.split(',').any(|flag| flag.trim() == MARKER_FLAG))
}

impl From<&TempoPoint> for Element {
    fn from(tempo: &TempoPoint) -> Self {
        Element::new("Tempo")
            .with_attribute("beats-per-minute", tempo.beats_per_minute)
            .with_attribute("movable", yes_no(tempo.movable))
            .with_attribute("note-type", tempo.note_type)
            .with_attribute("start", tempo.start)
    }
}

impl From<&MeterPoint> for Element {
    fn from(meter: &MeterPoint) -> Self {
        Element::new("Meter")
            .with_attribute("beats-per-bar", meter.beats_per_bar)
            .with_attribute("movable", yes_no(meter.movable))
            .with_attribute("note-type", meter.note_type)
            .with_attribute("start", meter.start)
    }
}

impl From<&Marker> for Element {
    fn from(marker: &Marker) -> Self {
        Element::new("Location")
            .with_attribute("name", &marker.name)
            .with_attribute("start", marker.sample)
            .with_attribute("end", marker.sample)
            .with_attribute("flags", MARKER_FLAG)
            .with_attribute("locked", yes_no(marker.locked))
            .with_attribute("id", marker.id)
    }
}

impl SessionDocument for ArdourSession {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn find_section(&self, section: Section) -> bool {
        self.root.find(section.element_name()).is_some()
    }

    fn remove_section(&mut self, section: Section) -> Result<(), SessionError> {
        let (index, _) = self
            .root
            .remove(section.element_name())
            .ok_or(SessionError::MissingSection(section))?;
        self.removed.insert(section, index);
        Ok(())
    }

    fn insert_section(&mut self, section: Section) -> Result<(), SessionError> {
        let element = Element::new(section.element_name());
        match self.removed.remove(&section) {
            Some(index) => self.root.insert(index, element),
            None => self.root.push(element),
        }
        Ok(())
    }

    fn remove_markers(&mut self) -> Result<usize, SessionError> {
        let locations = self.section_mut(Section::Locations)?;
        Ok(locations.retain_elements(|location| !is_marker(location)))
    }

    fn append_child(&mut self, record: Record) -> Result<(), SessionError> {
        let element = match &record {
            Record::Tempo(tempo) => Element::from(tempo),
            Record::Meter(meter) => Element::from(meter),
            Record::Marker(marker) => Element::from(marker),
        };
        self.section_mut(record.section())?.push(element);
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.id_counter;
        self.id_counter += 1;
        id
    }

    fn persist(&mut self) -> Result<(), SessionError> {
        let bytes = self.to_xml()?;
        let path = self.output.clone();
        let io_error = |source| SessionError::Io {
            path: path.clone(),
            source,
        };

        // Write next to the target and rename over it so a failed write
        // leaves the original session intact.
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(directory).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        // Temp files are created private; keep the mode of the file replaced.
        if let Ok(metadata) = fs::metadata(&path) {
            file.as_file()
                .set_permissions(metadata.permissions())
                .map_err(io_error)?;
        }
        file.persist(&path).map_err(|e| io_error(e.error))?;

        info!(path = %path.display(), bytes = bytes.len(), "Saved session");
        Ok(())
    }
}
