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

//! Converts a klick tempo map into the tempo map and markers of an Ardour
//! session.
//!
//! The tempo map is read by [`tempomap`], walked by [`timeline`] and written
//! into a [`session::SessionDocument`].

pub mod config;
pub mod session;
pub mod tempomap;
pub mod timeline;
