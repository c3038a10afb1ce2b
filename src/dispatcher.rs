// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Dispatcher`] resolving [`PickleStep`]s into step handler invocations.

use std::rc::Rc;

use derive_more::with_trait::Debug;

use crate::{pickle::PickleStep, registry::Registry};

/// Runs [`PickleStep`]s against the step definitions of a frozen
/// [`Registry`].
#[derive(Debug)]
pub struct Dispatcher<S> {
    registry: Rc<Registry<S>>,
}

// Implemented manually to omit redundant `S: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self { registry: Rc::clone(&self.registry) }
    }
}

impl<S> Dispatcher<S> {
    /// Creates a new [`Dispatcher`] over the given frozen [`Registry`].
    #[must_use]
    pub const fn new(registry: Rc<Registry<S>>) -> Self {
        Self { registry }
    }

    /// Runs the only step definition matching the given [`PickleStep`],
    /// resolving into the state it returns.
    ///
    /// # Errors
    ///
    /// - [`StepError`] if zero or several step definitions match, or if the
    ///   matched values don't fit their declared types.
    /// - Whatever error the handler returns, as is.
    ///
    /// [`StepError`]: crate::StepError
    pub async fn run_step(
        &self,
        step: &PickleStep,
        state: S,
    ) -> anyhow::Result<S> {
        let (def, params) = self.registry.steps().find(step)?;
        tracing::trace!(
            text = %step.text,
            pattern = def.pattern(),
            location = %def.location,
            "dispatching step",
        );
        (def.handler)(state, params, step.argument.clone()).await
    }
}
