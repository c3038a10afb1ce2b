// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Insertion-ordered [`Collection`] of [`StepDefinition`]s.

use derive_more::with_trait::Debug;

use crate::{parameter::Parameters, pickle::PickleStep};

use super::{Candidate, StepDefinition, StepError};

/// Collection of [`StepDefinition`]s, in registration order.
///
/// Registering the same pattern twice appends a second [`StepDefinition`],
/// which makes every step it matches ambiguous.
#[derive(Debug)]
pub struct Collection<S> {
    steps: Vec<StepDefinition<S>>,
}

// Implemented manually to omit redundant `S: Default` trait bound, imposed by
// `#[derive(Default)]`.
impl<S> Default for Collection<S> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<S> Collection<S> {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the given [`StepDefinition`].
    pub fn push(&mut self, step: StepDefinition<S>) {
        self.steps.push(step);
    }

    /// Returns the number of [`StepDefinition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Indicates whether there are no [`StepDefinition`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterates over the [`StepDefinition`]s in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition<S>> {
        self.steps.iter()
    }

    /// Returns the only [`StepDefinition`] matching the given [`PickleStep`]
    /// along with the [`Parameters`] it extracted.
    ///
    /// Every [`StepDefinition`] is tested, so ambiguity is always detected.
    ///
    /// # Errors
    ///
    /// - [`StepError::NotFound`] if nothing matches.
    /// - [`StepError::Ambiguous`] if more than one [`StepDefinition`] matches.
    /// - [`StepError::Parameter`] if the extracted values don't fit their
    ///   declared types.
    pub fn find(
        &self,
        step: &PickleStep,
    ) -> Result<(&StepDefinition<S>, Parameters), StepError> {
        let mut matched = self
            .steps
            .iter()
            .filter(|def| def.matcher.is_match(&step.text))
            .collect::<Vec<_>>();

        let def = match matched.len() {
            0 => return Err(StepError::not_found(step)),
            // Instead of `.unwrap()` to avoid documenting `# Panics`.
            1 => matched.pop().unwrap_or_else(|| unreachable!()),
            _ => {
                return Err(StepError::ambiguous(
                    step,
                    matched
                        .into_iter()
                        .map(|def| Candidate {
                            pattern: def.pattern().to_owned(),
                            location: def.location,
                        })
                        .collect(),
                ));
            }
        };

        let params = def
            .matcher
            .captures(&step.text)
            .map_err(|source| StepError::Parameter {
                keyword: step.ty.keyword(),
                text: step.text.clone(),
                source,
            })?
            .unwrap_or_default();

        Ok((def, params))
    }
}
