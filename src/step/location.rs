// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Location tracking for step and hook registrations.

use std::panic;

use derive_more::with_trait::Display;

/// Source location of a registration call, captured via `#[track_caller]`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the registration happened.
    pub path: &'static str,

    /// Line of the registration call.
    pub line: u32,

    /// Column of the registration call.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] with the given path, line, and column.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Captures the [`Location`] of the caller.
    ///
    /// Only meaningful when every function between the registration call and
    /// this one is annotated with `#[track_caller]`.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        panic::Location::caller().into()
    }

    /// Returns the file name part of the path.
    #[must_use]
    pub fn filename(&self) -> &'static str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(self.path)
    }
}

impl From<&'static panic::Location<'static>> for Location {
    fn from(loc: &'static panic::Location<'static>) -> Self {
        Self::new(loc.file(), loc.line(), loc.column())
    }
}
