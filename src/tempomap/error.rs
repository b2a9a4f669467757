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

use super::grammar::Rule;

/// Errors raised while reading a tempo map. The first malformed line aborts the read.
#[derive(Debug, thiserror::Error)]
pub enum TempomapError {
    #[error("couldn't parse tempo map entry on line {line_number}, column {column}:\n{line}")]
    Grammar {
        line_number: usize,
        column: usize,
        line: String,
        #[source]
        source: Box<pest::error::Error<Rule>>,
    },

    #[error("invalid tempo map entry on line {line_number} ({reason}):\n{line}")]
    InvalidEntry {
        line_number: usize,
        line: String,
        reason: String,
    },

    #[error("unable to read tempo map {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TempomapError {
    /// Returns the offending line text, if the error refers to one.
    pub fn line(&self) -> Option<&str> {
        match self {
            TempomapError::Grammar { line, .. } | TempomapError::InvalidEntry { line, .. } => {
                Some(line.as_str())
            }
            TempomapError::Io { .. } => None,
        }
    }
}
