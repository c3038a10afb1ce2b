// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber Expression][1] compilation into a [`Matcher`].
//!
//! [1]: https://github.com/cucumber/cucumber-expressions#readme

use std::collections::HashMap;

use cucumber_expressions::Expression;
use derive_more::with_trait::{Display, Error};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parameter::{ParameterError, ParameterKind, Parameters};

/// Regexes of the [`ParameterKind::EXTRA`] kinds, keyed by their names.
static EXTRA_PARAMETERS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| {
        ParameterKind::EXTRA
            .iter()
            .filter_map(|kind| Some((kind.name(), kind.extra_regex()?)))
            .collect()
    });

/// Compiled step pattern, able to test a step text and to extract its typed
/// [`Parameters`].
#[derive(Clone, Debug)]
pub struct Matcher {
    /// Pattern this [`Matcher`] was compiled from.
    pattern: String,

    /// [`Regex`] expanded from the [`Matcher::pattern`].
    regex: Regex,

    /// Declared [`ParameterKind`]s, in pattern order.
    kinds: Vec<ParameterKind>,

    /// Capturing groups holding every parameter value, in pattern order.
    slots: Vec<Slot>,
}

/// Capturing groups of a single parameter value.
///
/// Parameters expanding into several alternative groups (like `{string}`
/// does for its two quote styles) are named `__{id}_{n}` by
/// [`cucumber_expressions`], so all the groups sharing an `id` form one
/// [`Slot`]. Exactly one of them matches.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Slot {
    /// Indices of the alternative capturing groups.
    groups: Vec<usize>,

    /// Whether the groups capture contents of a quoted string, without the
    /// quotes themselves.
    quoted: bool,
}

impl Matcher {
    /// Compiles the given step `pattern`.
    ///
    /// # Errors
    ///
    /// If the `pattern` is malformed or declares an unknown parameter type.
    pub fn compile(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        let kinds = placeholders(&pattern)
            .into_iter()
            .map(|name| {
                ParameterKind::from_name(name).ok_or_else(|| {
                    PatternError::UnknownParameter {
                        pattern: pattern.clone(),
                        name: name.to_owned(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regex =
            Expression::regex_with_parameters(pattern.as_str(), &*EXTRA_PARAMETERS)
                .map_err(|e| PatternError::Compile {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;

        let slots = slots(&regex);
        if slots.len() != kinds.len() {
            return Err(PatternError::Compile {
                reason: format!(
                    "expected {} parameter groups in `{regex}`, found {}",
                    kinds.len(),
                    slots.len(),
                ),
                pattern,
            });
        }

        Ok(Self { pattern, regex, kinds, slots })
    }

    /// Returns the pattern this [`Matcher`] was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the expanded [`Regex`].
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the declared [`ParameterKind`]s, in pattern order.
    #[must_use]
    pub fn kinds(&self) -> &[ParameterKind] {
        &self.kinds
    }

    /// Checks whether the whole `text` is matched.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Matches the given `text`, converting every captured value into its
    /// declared type.
    ///
    /// Returns [`None`] if the `text` isn't matched.
    ///
    /// # Errors
    ///
    /// If a captured value cannot be converted into its declared type.
    pub fn captures(
        &self,
        text: &str,
    ) -> Result<Option<Parameters>, ParameterError> {
        let Some(caps) = self.regex.captures(text) else {
            return Ok(None);
        };

        self.kinds
            .iter()
            .zip(&self.slots)
            .map(|(kind, slot)| {
                let raw = slot
                    .groups
                    .iter()
                    .find_map(|&group| caps.get(group))
                    .map_or("", |m| {
                        // Quotes surround the group, so `convert()` unescapes
                        // the right quote style.
                        slot.quoted
                            .then(|| {
                                text.get(m.start().checked_sub(1)?..m.end() + 1)
                            })
                            .flatten()
                            .unwrap_or_else(|| m.as_str())
                    });
                kind.convert(raw)
            })
            .collect::<Result<Parameters, _>>()
            .map(Some)
    }
}

/// Error of compiling a step pattern.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum PatternError {
    /// Pattern is malformed.
    #[display("Failed to compile step pattern `{pattern}`: {reason}")]
    Compile {
        /// Offending pattern.
        #[error(not(source))]
        pattern: String,

        /// Why it failed.
        reason: String,
    },

    /// Pattern declares a parameter type nobody knows about.
    #[display("Unknown parameter type `{{{name}}}` in step pattern `{pattern}`")]
    UnknownParameter {
        /// Offending pattern.
        #[error(not(source))]
        pattern: String,

        /// Name of the unknown parameter type.
        name: String,
    },
}

/// Lists the names inside every unescaped `{}` of a pattern.
fn placeholders(pattern: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut chars = pattern.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                _ = chars.next();
            }
            '{' => {
                let name = chars
                    .by_ref()
                    .find(|(_, c)| *c == '}')
                    .and_then(|(end, _)| pattern.get(i + 1..end));
                names.extend(name);
            }
            _ => {}
        }
    }
    names
}

/// Groups the top-level capturing groups of a `regex` into parameter
/// [`Slot`]s.
fn slots(regex: &Regex) -> Vec<Slot> {
    let names = regex.capture_names().collect::<Vec<_>>();
    let parameter_id = |group: usize| {
        names
            .get(group)
            .copied()
            .flatten()
            .and_then(|n| n.strip_prefix("__"))
            .and_then(|n| n.split_once('_'))
            .map(|(id, _)| id)
    };

    let mut slots = Vec::<Slot>::new();
    let mut last_id = None;
    for group in top_level_groups(regex.as_str()) {
        let id = parameter_id(group);
        let alternative = id.is_some() && id == last_id;
        if let Some(slot) = slots.last_mut().filter(|_| alternative) {
            slot.groups.push(group);
            slot.quoted = true;
        } else {
            slots.push(Slot { groups: vec![group], quoted: false });
        }
        last_id = id;
    }
    slots
}

/// Returns indices of the capturing groups not nested into another capturing
/// group.
fn top_level_groups(regex: &str) -> Vec<usize> {
    let bytes = regex.as_bytes();
    let at = |i: usize| bytes.get(i).copied();

    let mut open = Vec::<bool>::new();
    let mut in_class = false;
    let (mut index, mut i) = (0, 0);
    let mut top = Vec::new();

    while let Some(b) = at(i) {
        match b {
            b'\\' => i += 1,
            b'[' if !in_class => {
                in_class = true;
                if at(i + 1) == Some(b'^') {
                    i += 1;
                }
                if at(i + 1) == Some(b']') {
                    i += 1;
                }
            }
            b']' if in_class => in_class = false,
            b'(' if !in_class => {
                let capturing = at(i + 1) != Some(b'?')
                    || at(i + 2) == Some(b'P')
                    || (at(i + 2) == Some(b'<')
                        && !matches!(at(i + 3), Some(b'=' | b'!')));
                if capturing {
                    index += 1;
                    if !open.contains(&true) {
                        top.push(index);
                    }
                }
                open.push(capturing);
            }
            b')' if !in_class => {
                _ = open.pop();
            }
            _ => {}
        }
        i += 1;
    }
    top
}
