// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Session`] holding the state of a single document run.

use std::rc::Rc;

use derive_more::with_trait::Debug;

use crate::{
    dispatcher::Dispatcher, orchestrator::HookOrchestrator,
    pickle::PickleStep, program::Call, registry::Registry,
};

/// State slot of a single document run, along with the [`Dispatcher`] and the
/// [`HookOrchestrator`] every [`Call`] is performed with.
///
/// The state starts as `S::default()`. A successful [`Call`] replaces it with
/// the state its handler resolved into, while a failed one leaves the last
/// good state in place.
///
/// Handlers take the state by value and may modify it before failing, so
/// every [`Call`] is handed a clone of it. That is what `S: Clone` is
/// required for.
#[derive(Debug)]
pub struct Session<S> {
    dispatcher: Dispatcher<S>,
    hooks: HookOrchestrator<S>,
    state: S,
}

impl<S: Clone + Default + 'static> Session<S> {
    /// Creates a new [`Session`] over the given frozen [`Registry`], starting
    /// from the default state.
    #[must_use]
    pub fn new(registry: Rc<Registry<S>>) -> Self {
        Self::with_state(registry, S::default())
    }

    /// Creates a new [`Session`] over the given frozen [`Registry`], starting
    /// from the given `state`.
    #[must_use]
    pub fn with_state(registry: Rc<Registry<S>>, state: S) -> Self {
        Self {
            dispatcher: Dispatcher::new(Rc::clone(&registry)),
            hooks: HookOrchestrator::new(registry),
            state,
        }
    }

    /// Performs the given [`Call`], threading the state through it.
    ///
    /// # Errors
    ///
    /// If the step JSON is malformed, or the dispatch or a handler fails.
    pub async fn call(&mut self, call: &Call) -> anyhow::Result<()> {
        let state = self.state.clone();
        self.state = match call {
            Call::ApplyHooks { phase, tags } => {
                self.hooks.apply_hooks(*phase, state, tags.as_deref()).await?
            }
            Call::RunStep { step } => {
                let step = PickleStep::from_json(step)?;
                self.dispatcher.run_step(&step, state).await?
            }
        };
        Ok(())
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Consumes this [`Session`], returning the last state.
    #[must_use]
    pub fn into_state(self) -> S {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::{program::dsl::*, Hook};

    #[derive(Clone, Default, PartialEq, std::fmt::Debug)]
    struct Counter {
        n: i64,
    }

    fn session() -> Session<Counter> {
        let mut registry = Registry::new();
        _ = registry
            .when("I increase the counter by {int}", |mut c: Counter, p, _| async move {
                c.n += p.int(0)?;
                anyhow::Ok(c)
            })
            .unwrap()
            .when("I break", |_, _, _| async { Err(anyhow::anyhow!("broken")) })
            .unwrap()
            .when("I overflow", |mut c: Counter, _, _| async move {
                c.n = i64::MAX;
                anyhow::ensure!(c.n < 1_000, "overflow at {}", c.n);
                Ok(c)
            })
            .unwrap()
            .before(Hook::new(|mut c: Counter| async move {
                c.n += 100;
                anyhow::Ok(c)
            }).tags("@boost"))
            .unwrap();
        Session::new(registry.freeze())
    }

    fn step(text: &str) -> Call {
        run_step(&format!(r#"{{"text":"{text}","type":"Action"}}"#))
    }

    #[test]
    fn threads_state_through_calls() {
        let mut s = session();

        block_on(async {
            for _ in 0..3 {
                s.call(&step("I increase the counter by 1")).await?;
            }
            anyhow::Ok(())
        })
        .unwrap();
        assert_eq!(s.state(), &Counter { n: 3 });
    }

    #[test]
    fn failed_call_keeps_last_good_state() {
        let mut s = session();

        block_on(s.call(&step("I increase the counter by 2"))).unwrap();
        let err = block_on(s.call(&step("I break"))).unwrap_err();

        assert_eq!(err.to_string(), "broken");
        assert_eq!(s.into_state(), Counter { n: 2 });
    }

    #[test]
    fn modifications_of_failed_handler_are_discarded() {
        let mut s = session();

        block_on(s.call(&step("I increase the counter by 7"))).unwrap();
        assert!(block_on(s.call(&step("I overflow"))).is_err());

        assert_eq!(s.state(), &Counter { n: 7 });
    }

    #[test]
    fn applies_tagged_hooks() {
        let mut s = session();

        block_on(s.call(&apply_tagged_hooks(HookPhase::Before, &["@other"]))).unwrap();
        assert_eq!(s.state().n, 0);

        block_on(s.call(&apply_tagged_hooks(HookPhase::Before, &["@boost"]))).unwrap();
        assert_eq!(s.state().n, 100);
    }

    #[test]
    fn malformed_step_json_is_an_error() {
        let mut s = session();

        assert!(block_on(s.call(&run_step("{not json"))).is_err());
        assert_eq!(s.state().n, 0);
    }
}
