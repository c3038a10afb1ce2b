// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Loading of `.feature` [`Document`]s.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use derive_more::with_trait::{Display, Error};
use gherkin::GherkinEnv;

use crate::pickle::{self, ExpandExamplesError, Pickle};

/// Parsed `.feature` file.
#[derive(Clone, Debug)]
pub struct Document {
    /// URI of this [`Document`], as it's reported in test names and errors.
    pub uri: String,

    /// Feature of this [`Document`].
    ///
    /// [`None`] if the document contains only comments and blank lines.
    pub feature: Option<gherkin::Feature>,

    /// Text this [`Document`] was parsed from.
    pub source: String,
}

impl Document {
    /// Parses a [`Document`] out of the given `input`.
    ///
    /// # Errors
    ///
    /// If the `input` isn't valid [Gherkin][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference
    pub fn parse_str(
        uri: impl Into<String>,
        input: &str,
    ) -> Result<Self, LoadError> {
        let uri = uri.into();

        let is_blank = input
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#'));
        if is_blank {
            return Ok(Self { uri, feature: None, source: input.to_owned() });
        }

        let feature = gherkin::Feature::parse(input, GherkinEnv::default())
            .map_err(|source| LoadError::Parse { uri: uri.clone(), source })?;
        Ok(Self { uri, feature: Some(feature), source: input.to_owned() })
    }

    /// Reads and parses a [`Document`] at the given `path`.
    ///
    /// The [`Document::uri`] is the `path` with `/` separators.
    ///
    /// # Errors
    ///
    /// If the file cannot be read, or isn't valid [Gherkin][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference
    pub fn parse_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;

        let mut doc = Self::parse_str(uri_of(path), &input)?;
        if let Some(f) = doc.feature.as_mut() {
            f.path = Some(path.to_owned());
        }
        Ok(doc)
    }

    /// Compiles this [`Document`] into [`Pickle`]s.
    ///
    /// # Errors
    ///
    /// If a [`Scenario Outline`][1] cannot be expanded.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    pub fn pickles(&self) -> Result<Vec<Pickle>, ExpandExamplesError> {
        self.feature
            .as_ref()
            .map_or_else(
                || Ok(Vec::new()),
                |f| pickle::compile(f, &self.uri, &self.source),
            )
    }

    /// Returns the name of this [`Document`]'s feature, if any.
    #[must_use]
    pub fn feature_name(&self) -> Option<&str> {
        self.feature.as_ref().map(|f| f.name.as_str())
    }
}

/// Finds all the files under `base` matching the given glob `pattern`, sorted
/// by path.
///
/// # Errors
///
/// If the `pattern` is malformed, or a directory under `base` cannot be
/// walked.
pub fn discover(
    base: impl AsRef<Path>,
    pattern: &str,
) -> Result<Vec<PathBuf>, LoadError> {
    let base = base.as_ref();
    let walker = globwalk::GlobWalkerBuilder::from_patterns(base, &[pattern])
        .case_insensitive(true)
        .build()
        .map_err(|e| LoadError::Glob {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;

    let mut paths = walker
        .filter_map(|entry| match entry {
            Ok(e) => e.file_type().is_file().then(|| Ok(e.path().to_owned())),
            Err(e) => Some(Err(LoadError::Walk {
                path: e.path().unwrap_or(base).to_owned(),
                source: e,
            })),
        })
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

/// Returns the URI of the given `path`, with `/` separators.
#[must_use]
pub fn uri_of(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Error of loading a [`Document`].
#[derive(Debug, Display, Error)]
pub enum LoadError {
    /// File cannot be read.
    #[display("Failed to read `{}`: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,

        /// Underlying error.
        source: io::Error,
    },

    /// File isn't valid Gherkin.
    #[display("Failed to parse `{uri}`: {source}")]
    Parse {
        /// URI of the document.
        uri: String,

        /// Underlying error.
        source: gherkin::ParseError,
    },

    /// Directory cannot be walked while discovering files.
    #[display("Failed to walk `{}`: {source}", path.display())]
    Walk {
        /// Path the walk failed on.
        path: PathBuf,

        /// Underlying error.
        source: globwalk::WalkError,
    },

    /// Glob pattern is malformed.
    #[display("Invalid glob pattern `{pattern}`: {reason}")]
    Glob {
        /// Offending pattern.
        #[error(not(source))]
        pattern: String,

        /// Why the pattern is invalid.
        reason: String,
    },
}
