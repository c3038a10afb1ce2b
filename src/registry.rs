// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Registry`] of step definitions and lifecycle hooks.

use std::{collections::HashMap, future::Future, rc::Rc};

use derive_more::with_trait::{Debug, Display, Error, From};
use futures::FutureExt as _;

use crate::{
    hook::{Hook, HookPhase, RegisteredHook},
    parameter::Parameters,
    pickle::StepArgument,
    step::{Collection, Location, Matcher, PatternError, StepDefinition},
    tag::{TagExpression, TagExpressionError},
};

/// Store of step definitions and [`Hook`]s, populated during the load phase.
///
/// Registration order is preserved: re-registering a pattern appends a second
/// definition instead of replacing the first one. Once loaded, the
/// [`Registry`] is [frozen](Registry::freeze) and shared read-only.
///
/// ```rust
/// # use cucumber_harness::{Hook, Registry};
/// # fn main() -> Result<(), cucumber_harness::RegistrationError> {
/// let mut registry = Registry::<u64>::new();
/// registry
///     .given("the counter is {int}", |_, params, _| async move {
///         Ok::<_, anyhow::Error>(params.int(0)? as u64)
///     })?
///     .when("I increase the counter by {int}", |n, params, _| async move {
///         Ok::<_, anyhow::Error>(n + params.int(0)? as u64)
///     })?
///     .before(Hook::new(|n| async move { Ok::<_, anyhow::Error>(n) }).tags("@counter"))?;
///
/// let registry = registry.freeze();
/// assert_eq!(registry.steps().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Registry<S> {
    /// Step definitions, in registration order.
    steps: Collection<S>,

    /// Hooks of every [`HookPhase`], in registration order.
    hooks: HashMap<HookPhase, Vec<RegisteredHook<S>>>,
}

// Implemented manually to omit redundant `S: Default` trait bound, imposed by
// `#[derive(Default)]`.
impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self { steps: Collection::new(), hooks: HashMap::new() }
    }
}

impl<S: 'static> Registry<S> {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a step definition matching the given [Cucumber Expression][1].
    ///
    /// The `handler` receives the current state, the typed [`Parameters`]
    /// and the step's [`StepArgument`], and resolves into the next state.
    ///
    /// # Errors
    ///
    /// If the `pattern` cannot be compiled.
    ///
    /// [1]: https://github.com/cucumber/cucumber-expressions#readme
    #[track_caller]
    pub fn step<F, Fut, E>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(S, Parameters, Option<StepArgument>) -> Fut + 'static,
        Fut: Future<Output = Result<S, E>> + 'static,
        E: Into<anyhow::Error>,
    {
        let location = Location::caller();
        let matcher = Matcher::compile(pattern)?;
        tracing::debug!(pattern = matcher.pattern(), %location, "registered step");

        self.steps.push(StepDefinition {
            matcher,
            handler: Box::new(move |state, params, arg| {
                handler(state, params, arg)
                    .map(|res| res.map_err(Into::into))
                    .boxed_local()
            }),
            location,
        });
        Ok(self)
    }

    /// Alias for [`Registry::step()`].
    ///
    /// The keyword doesn't restrict which steps get matched.
    ///
    /// # Errors
    ///
    /// If the `pattern` cannot be compiled.
    #[track_caller]
    pub fn given<F, Fut, E>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(S, Parameters, Option<StepArgument>) -> Fut + 'static,
        Fut: Future<Output = Result<S, E>> + 'static,
        E: Into<anyhow::Error>,
    {
        self.step(pattern, handler)
    }

    /// Alias for [`Registry::step()`].
    ///
    /// The keyword doesn't restrict which steps get matched.
    ///
    /// # Errors
    ///
    /// If the `pattern` cannot be compiled.
    #[track_caller]
    pub fn when<F, Fut, E>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(S, Parameters, Option<StepArgument>) -> Fut + 'static,
        Fut: Future<Output = Result<S, E>> + 'static,
        E: Into<anyhow::Error>,
    {
        self.step(pattern, handler)
    }

    /// Alias for [`Registry::step()`].
    ///
    /// The keyword doesn't restrict which steps get matched.
    ///
    /// # Errors
    ///
    /// If the `pattern` cannot be compiled.
    #[track_caller]
    pub fn then<F, Fut, E>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(S, Parameters, Option<StepArgument>) -> Fut + 'static,
        Fut: Future<Output = Result<S, E>> + 'static,
        E: Into<anyhow::Error>,
    {
        self.step(pattern, handler)
    }

    /// Registers the given [`Hook`] to run at the given [`HookPhase`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn hook(
        &mut self,
        phase: HookPhase,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        let location = Location::caller();
        let Hook { name, tags, handler } = hook;
        let tags = tags.map(TagExpression::parse).transpose()?;
        tracing::debug!(
            %phase,
            name = name.as_deref(),
            tags = tags.as_ref().map(TagExpression::as_str),
            %location,
            "registered hook",
        );

        self.hooks.entry(phase).or_default().push(RegisteredHook {
            phase,
            name,
            tags,
            handler,
            location,
        });
        Ok(self)
    }

    /// Registers a [`HookPhase::BeforeAll`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn before_all(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::BeforeAll, hook)
    }

    /// Registers a [`HookPhase::Before`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn before(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::Before, hook)
    }

    /// Registers a [`HookPhase::BeforeStep`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn before_step(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::BeforeStep, hook)
    }

    /// Registers a [`HookPhase::AfterStep`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn after_step(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::AfterStep, hook)
    }

    /// Registers a [`HookPhase::After`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn after(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::After, hook)
    }

    /// Registers a [`HookPhase::AfterAll`] [`Hook`].
    ///
    /// # Errors
    ///
    /// If the [`Hook::tags()`] expression is malformed.
    #[track_caller]
    pub fn after_all(
        &mut self,
        hook: Hook<S>,
    ) -> Result<&mut Self, RegistrationError> {
        self.hook(HookPhase::AfterAll, hook)
    }
}

impl<S> Registry<S> {
    /// Returns the registered step definitions.
    #[must_use]
    pub const fn steps(&self) -> &Collection<S> {
        &self.steps
    }

    /// Returns the [`Hook`]s registered for the given [`HookPhase`], in
    /// registration order.
    #[must_use]
    pub fn hooks(&self, phase: HookPhase) -> &[RegisteredHook<S>] {
        self.hooks.get(&phase).map(Vec::as_slice).unwrap_or_default()
    }

    /// Ends the load phase, making this [`Registry`] shareable read-only.
    #[must_use]
    pub fn freeze(self) -> Rc<Self> {
        tracing::debug!(
            steps = self.steps.len(),
            hooks = self.hooks.values().map(Vec::len).sum::<usize>(),
            "registry frozen",
        );
        Rc::new(self)
    }
}

/// Error of registering a step definition or a [`Hook`].
#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum RegistrationError {
    /// Step pattern cannot be compiled.
    #[display("{_0}")]
    Pattern(PatternError),

    /// Hook tag expression is malformed.
    #[display("{_0}")]
    TagExpression(TagExpressionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(
        n: u32,
        _: Parameters,
        _: Option<StepArgument>,
    ) -> impl Future<Output = anyhow::Result<u32>> {
        async move { Ok(n) }
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = Registry::new();
        registry
            .given("first", noop)
            .unwrap()
            .when("second", noop)
            .unwrap()
            .then("first", noop)
            .unwrap();

        assert_eq!(
            registry.steps().iter().map(|s| s.pattern()).collect::<Vec<_>>(),
            ["first", "second", "first"],
        );
    }

    #[test]
    fn captures_registration_location() {
        let mut registry = Registry::new();
        _ = registry.step("located", noop).unwrap();

        let location = registry.steps().iter().next().unwrap().location;
        assert!(location.path.ends_with("registry.rs"), "{location}");
    }

    #[test]
    fn rejects_bad_patterns_immediately() {
        let mut registry = Registry::new();

        assert!(matches!(
            registry.step("I see a {color} car", noop),
            Err(RegistrationError::Pattern(PatternError::UnknownParameter { .. })),
        ));
        assert!(registry.steps().is_empty());
    }

    #[test]
    fn hooks_are_grouped_by_phase_in_order() {
        let mut registry = Registry::new();
        for name in ["h1", "h2", "h3"] {
            _ = registry
                .before(Hook::new(|n: u32| async move { anyhow::Ok(n) }).name(name))
                .unwrap();
        }
        _ = registry
            .after_all(Hook::new(|n: u32| async move { anyhow::Ok(n) }))
            .unwrap();

        assert_eq!(
            registry
                .hooks(HookPhase::Before)
                .iter()
                .map(|h| h.name.as_deref())
                .collect::<Vec<_>>(),
            [Some("h1"), Some("h2"), Some("h3")],
        );
        assert_eq!(registry.hooks(HookPhase::AfterAll).len(), 1);
        assert!(registry.hooks(HookPhase::BeforeStep).is_empty());
    }

    #[test]
    fn rejects_bad_tag_filters_immediately() {
        let mut registry = Registry::new();

        let res = registry.before(
            Hook::new(|n: u32| async move { anyhow::Ok(n) }).tags("@a and"),
        );
        assert!(matches!(res, Err(RegistrationError::TagExpression(_))));
        assert!(registry.hooks(HookPhase::Before).is_empty());
    }
}
