// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle [`Hook`]s.

use std::future::Future;

use derive_more::with_trait::{Debug, Display};
use futures::{future::LocalBoxFuture, FutureExt as _};

use crate::{step::Location, tag::TagExpression};

/// Type-erased hook handler, resolving the given state into the next one.
pub type HookFn<S> = Box<dyn Fn(S) -> LocalBoxFuture<'static, anyhow::Result<S>>>;

/// Point of the execution lifecycle a [`Hook`] runs at.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HookPhase {
    /// Once per document, before anything else.
    #[display("beforeAll")]
    BeforeAll,

    /// Before every scenario.
    #[display("before")]
    Before,

    /// Before every step.
    #[display("beforeStep")]
    BeforeStep,

    /// After every step.
    #[display("afterStep")]
    AfterStep,

    /// After every scenario.
    #[display("after")]
    After,

    /// Once per document, after everything else.
    #[display("afterAll")]
    AfterAll,
}

impl HookPhase {
    /// All the [`HookPhase`]s, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::BeforeAll,
        Self::Before,
        Self::BeforeStep,
        Self::AfterStep,
        Self::After,
        Self::AfterAll,
    ];

    /// Returns the Rust path of this [`HookPhase`] variant.
    #[must_use]
    pub const fn variant(self) -> &'static str {
        match self {
            Self::BeforeAll => "BeforeAll",
            Self::Before => "Before",
            Self::BeforeStep => "BeforeStep",
            Self::AfterStep => "AfterStep",
            Self::After => "After",
            Self::AfterAll => "AfterAll",
        }
    }
}

/// Lifecycle hook, not yet registered.
///
/// Created from a mandatory handler, with optional [`Hook::name()`] and
/// [`Hook::tags()`]:
/// ```rust
/// # use cucumber_harness::Hook;
/// let hook = Hook::new(|n: u32| async move { Ok::<_, anyhow::Error>(n + 1) })
///     .name("increment")
///     .tags("@counter and not @wip");
/// ```
#[derive(Debug)]
pub struct Hook<S> {
    /// Name of this [`Hook`], used for diagnostics only.
    pub(crate) name: Option<String>,

    /// Uncompiled tag expression filtering this [`Hook`].
    pub(crate) tags: Option<String>,

    /// Handler of this [`Hook`].
    #[debug(skip)]
    pub(crate) handler: HookFn<S>,
}

impl<S: 'static> Hook<S> {
    /// Creates a new [`Hook`] with the given `handler`.
    pub fn new<F, Fut, E>(handler: F) -> Self
    where
        F: Fn(S) -> Fut + 'static,
        Fut: Future<Output = Result<S, E>> + 'static,
        E: Into<anyhow::Error>,
    {
        Self {
            name: None,
            tags: None,
            handler: Box::new(move |state| {
                handler(state).map(|res| res.map_err(Into::into)).boxed_local()
            }),
        }
    }
}

impl<S> Hook<S> {
    /// Names this [`Hook`].
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts this [`Hook`] to scenarios whose tags satisfy the given
    /// [tag expression][1].
    ///
    /// The expression is compiled on registration.
    ///
    /// [1]: https://cucumber.io/docs/cucumber/api#tag-expressions
    #[must_use]
    pub fn tags(mut self, expression: impl Into<String>) -> Self {
        self.tags = Some(expression.into());
        self
    }
}

/// [`Hook`] registered in a [`Registry`].
///
/// [`Registry`]: crate::Registry
#[derive(Debug)]
pub struct RegisteredHook<S> {
    /// Phase this hook runs at.
    pub phase: HookPhase,

    /// Name of this hook, if any.
    pub name: Option<String>,

    /// Compiled tag filter of this hook, if any.
    pub tags: Option<TagExpression>,

    /// Handler of this hook.
    #[debug(skip)]
    pub handler: HookFn<S>,

    /// Where this hook was registered.
    pub location: Location,
}

impl<S> RegisteredHook<S> {
    /// Checks whether this hook applies to a scenario with the given tags.
    ///
    /// [`None`] `tags` means no filtering.
    #[must_use]
    pub fn applies_to<T: AsRef<str>>(&self, tags: Option<&[T]>) -> bool {
        match (&self.tags, tags) {
            (Some(expr), Some(tags)) => {
                expr.eval(tags.iter().map(AsRef::<str>::as_ref))
            }
            (None, _) | (_, None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    fn registered(tags: Option<&str>) -> RegisteredHook<u32> {
        let hook = Hook::new(|n: u32| async move { anyhow::Ok(n + 1) });
        RegisteredHook {
            phase: HookPhase::Before,
            name: hook.name,
            tags: tags.map(|t| TagExpression::parse(t).unwrap()),
            handler: hook.handler,
            location: Location::new("hooks.rs", 1, 1),
        }
    }

    #[test]
    fn builder_sets_options() {
        let hook = Hook::new(|n: u32| async move { anyhow::Ok(n) })
            .name("reset")
            .tags("@db");

        assert_eq!(hook.name.as_deref(), Some("reset"));
        assert_eq!(hook.tags.as_deref(), Some("@db"));
    }

    #[test]
    fn handler_errors_are_converted() {
        #[derive(std::fmt::Debug, derive_more::Display, derive_more::Error)]
        #[display("boom")]
        struct Boom;

        let hook = Hook::new(|_: u32| async { Err::<u32, _>(Boom) });
        let err = block_on((hook.handler)(0)).unwrap_err();
        assert!(err.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn tag_filter_applies() {
        let hook = registered(Some("@a and not @b"));

        assert!(hook.applies_to(Some(["@a"].as_slice())));
        assert!(!hook.applies_to(Some(["@a", "@b"].as_slice())));
        assert!(hook.applies_to::<&str>(None));
        assert!(registered(None).applies_to(Some(["@b"].as_slice())));
    }

    #[test]
    fn displays_lifecycle_names() {
        assert_eq!(
            HookPhase::ALL.map(|p| p.to_string()),
            ["beforeAll", "before", "beforeStep", "afterStep", "after", "afterAll"],
        );
    }
}
