// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`HookOrchestrator`] running lifecycle hooks of a frozen [`Registry`].

use std::rc::Rc;

use derive_more::with_trait::Debug;

use crate::{hook::HookPhase, registry::Registry};

/// Runs every applicable [`Hook`] of a [`HookPhase`], threading a single state
/// value through them.
///
/// [`Hook`]: crate::Hook
#[derive(Debug)]
pub struct HookOrchestrator<S> {
    registry: Rc<Registry<S>>,
}

// Implemented manually to omit redundant `S: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<S> Clone for HookOrchestrator<S> {
    fn clone(&self) -> Self {
        Self { registry: Rc::clone(&self.registry) }
    }
}

impl<S> HookOrchestrator<S> {
    /// Creates a new [`HookOrchestrator`] over the given frozen [`Registry`].
    #[must_use]
    pub const fn new(registry: Rc<Registry<S>>) -> Self {
        Self { registry }
    }

    /// Runs the hooks of the given `phase` in registration order, feeding the
    /// state returned by each one into the next.
    ///
    /// Hooks whose tag filter rejects the given `tags` are skipped. [`None`]
    /// `tags` disable filtering altogether.
    ///
    /// # Errors
    ///
    /// Whatever error the first failing hook returns, as is. The remaining
    /// hooks are not run.
    pub async fn apply_hooks<T: AsRef<str>>(
        &self,
        phase: HookPhase,
        mut state: S,
        tags: Option<&[T]>,
    ) -> anyhow::Result<S> {
        for hook in self.registry.hooks(phase) {
            if !hook.applies_to(tags) {
                tracing::trace!(
                    %phase,
                    name = hook.name.as_deref(),
                    location = %hook.location,
                    "hook filtered out",
                );
                continue;
            }
            tracing::trace!(
                %phase,
                name = hook.name.as_deref(),
                location = %hook.location,
                "running hook",
            );
            state = (hook.handler)(state).await?;
        }
        Ok(state)
    }
}
