// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Error`] of this crate.
//!
//! Every fallible operation has its own narrow error type. [`Error`] unifies
//! them for callers driving several stages at once, like the [`Harness`].
//!
//! [`Harness`]: crate::harness::Harness

use std::{io, path::PathBuf};

use derive_more::with_trait::{Display, From};

use crate::{
    data_table::DataTableError, document::LoadError, generate::GenerateError,
    registry::RegistrationError, step::StepError, tag::TagExpressionError,
};

/// Top-level error of this crate.
#[derive(Debug, Display, derive_more::with_trait::Error, From)]
pub enum Error {
    /// Step definition or hook cannot be registered.
    #[display("Registration failed: {_0}")]
    Registration(RegistrationError),

    /// Step cannot be dispatched.
    #[display("{_0}")]
    Step(StepError),

    /// Data table cannot be extracted.
    #[display("{_0}")]
    DataTable(DataTableError),

    /// Tag filter is malformed.
    #[display("Invalid tag filter: {_0}")]
    TagFilter(TagExpressionError),

    /// Document cannot be loaded.
    #[display("{_0}")]
    Load(LoadError),

    /// Program cannot be generated.
    #[display("{_0}")]
    Generate(GenerateError),

    /// I/O operation failed.
    #[display("I/O operation failed on `{}`: {source}", path.display())]
    #[from(skip)]
    Io {
        /// Path the operation was performed on.
        path: PathBuf,

        /// Underlying error.
        source: io::Error,
    },
}

impl Error {
    /// Creates a new [`Error::Io`] for the given `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn converts_narrow_errors() {
        let err = Error::from(DataTableError::Missing);

        assert!(matches!(err, Error::DataTable(_)));
        assert_eq!(err.to_string(), "No data table argument provided");
    }

    #[test]
    fn io_error_mentions_path() {
        let err = Error::io(
            "out/login.rs",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(
            err.to_string(),
            "I/O operation failed on `out/login.rs`: denied",
        );
        assert!(err.source().is_some());
    }
}
