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
use std::fs;
use std::path::Path;
use std::str::FromStr;

use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use tracing::{debug, warn};

use super::error::TempomapError;
use super::grammar::{Rule, TempomapParser};
use super::TempomapEntry;

/// Reads and parses the tempo map at the given path.
pub fn read_tempomap(path: &Path) -> Result<Vec<TempomapEntry>, TempomapError> {
    debug!(path = %path.display(), "Reading tempo map");
    let content = fs::read_to_string(path).map_err(|source| TempomapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tempomap(&content)
}

/// Parses tempo map text into entries, one per non-blank line, in input order.
pub fn parse_tempomap(content: &str) -> Result<Vec<TempomapEntry>, TempomapError> {
    let mut entries = Vec::new();
    let mut labels = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if TempomapParser::parse(Rule::blank, line).is_ok() {
            continue;
        }

        let entry = parse_line(line, line_number)?;
        if let Some(label) = &entry.label {
            if !labels.insert(label.clone()) {
                warn!(
                    label = %label,
                    line_number,
                    "Label appears more than once in the tempo map"
                );
            }
        }
        entries.push(entry);
    }

    debug!(entries = entries.len(), "Parsed tempo map");
    Ok(entries)
}

fn parse_line(line: &str, line_number: usize) -> Result<TempomapEntry, TempomapError> {
    let mut pairs = TempomapParser::parse(Rule::entry, line).map_err(|e| {
        let column = match e.line_col {
            LineColLocation::Pos((_, col)) => col,
            LineColLocation::Span((_, col), _) => col,
        };
        TempomapError::Grammar {
            line_number,
            column,
            line: line.to_string(),
            source: Box::new(e),
        }
    })?;

    let invalid = |reason: String| TempomapError::InvalidEntry {
        line_number,
        line: line.to_string(),
        reason,
    };

    let mut entry = TempomapEntry::new(0, 0.0);
    entry.line = line_number;

    // The entry rule always produces exactly one pair.
    let Some(pair) = pairs.next() else {
        return Err(invalid("empty entry".to_string()));
    };

    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::label => entry.label = Some(inner_pair.as_str().to_string()),
            Rule::bars => entry.bars = parse_value(&inner_pair, "bar count").map_err(invalid)?,
            Rule::meter => {
                for meter_pair in inner_pair.into_inner() {
                    match meter_pair.as_rule() {
                        Rule::beats => {
                            entry.beats =
                                parse_value(&meter_pair, "beats per bar").map_err(invalid)?
                        }
                        Rule::denom => {
                            entry.denom =
                                parse_value(&meter_pair, "beat unit").map_err(invalid)?
                        }
                        _ => {}
                    }
                }
            }
            Rule::tempo => entry.tempo = parse_value(&inner_pair, "tempo").map_err(invalid)?,
            Rule::tempo2 => {
                entry.tempo2 = Some(parse_value(&inner_pair, "ramp tempo").map_err(invalid)?)
            }
            Rule::pattern => entry.pattern = Some(inner_pair.as_str().to_string()),
            Rule::volume => {
                entry.volume = Some(parse_value(&inner_pair, "volume").map_err(invalid)?)
            }
            _ => {
                // EOI
            }
        }
    }

    validate_entry(&entry).map_err(invalid)?;
    Ok(entry)
}

fn parse_value<T>(pair: &Pair<Rule>, what: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = pair.as_str();
    value
        .parse()
        .map_err(|e| format!("{} '{}' is out of range: {}", what, value, e))
}

/// Checks the invariants the conversion formulas rely on.
fn validate_entry(entry: &TempomapEntry) -> Result<(), String> {
    if entry.bars == 0 {
        return Err("bar count must be at least 1".to_string());
    }
    if entry.beats == 0 {
        return Err("beats per bar must be at least 1".to_string());
    }
    if entry.denom == 0 {
        return Err("beat unit must be at least 1".to_string());
    }
    if entry.bars.checked_mul(entry.beats).is_none() {
        return Err("entry spans too many beats".to_string());
    }
    if !(entry.tempo.is_finite() && entry.tempo > 0.0) {
        return Err("tempo must be greater than zero".to_string());
    }
    if let Some(tempo2) = entry.tempo2 {
        if !(tempo2.is_finite() && tempo2 > 0.0) {
            return Err("ramp tempo must be greater than zero".to_string());
        }
    }
    Ok(())
}
