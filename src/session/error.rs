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

use std::path::PathBuf;

use super::Section;

/// Errors raised while loading, editing or saving a session document.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unable to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unable to serialize session: {0}")]
    Write(#[from] std::io::Error),

    #[error("session document has no root element")]
    NoRoot,

    #[error("session document has no {0} section")]
    MissingSection(Section),

    #[error("session element {element} has no {attribute} attribute")]
    MissingAttribute { element: String, attribute: String },

    #[error("session attribute {attribute} has invalid value '{value}'")]
    InvalidAttribute { attribute: String, value: String },
}
