// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Executable test [`Program`] of a single document.
//!
//! A [`Program`] is a tree of [`Suite`]s, [`Test`]s and [`LifecycleHook`]s,
//! each calling either the hook orchestrator or the step dispatcher. It's
//! either executed directly by a [`host::Runner`], or [printed](printer) into
//! Rust source rebuilding it via the [`dsl`].
//!
//! [`host::Runner`]: crate::host::Runner

pub mod dsl;
pub mod printer;

use crate::hook::HookPhase;

/// Test program generated out of a single document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    /// URI of the document this [`Program`] was generated from.
    pub source: String,

    /// Verbatim header of the printed source, importing step definitions.
    pub imports: String,

    /// Top-level [`Node`]s.
    pub nodes: Vec<Node>,
}

impl Program {
    /// Prints this [`Program`] into Rust source.
    ///
    /// See [`printer`] for details.
    #[must_use]
    pub fn print(&self) -> String {
        printer::print(self)
    }

    /// Counts all the [`Test`]s of this [`Program`], skipped ones included.
    #[must_use]
    pub fn count_tests(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|n| match n {
                    Node::Test(_) => 1,
                    Node::Suite(s) => count(&s.nodes),
                    Node::Lifecycle(_) => 0,
                })
                .sum()
        }
        count(&self.nodes)
    }
}

/// Element of a [`Program`] tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// Callback of the enclosing [`Suite`] (or of the whole [`Program`]).
    Lifecycle(LifecycleHook),

    /// Named group of [`Node`]s.
    Suite(Suite),

    /// Single test case.
    Test(Test),
}

/// Callback run around the [`Test`]s of its enclosing [`Suite`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LifecycleHook {
    /// When this callback runs.
    pub kind: LifecycleKind,

    /// What this callback does.
    pub call: Call,
}

/// When a [`LifecycleHook`] runs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleKind {
    /// Once, before the first [`Test`] of the [`Suite`].
    BeforeAll,

    /// Once, after the last [`Test`] of the [`Suite`].
    AfterAll,

    /// Before every [`Test`] of the [`Suite`], nested ones included.
    BeforeEach,

    /// After every [`Test`] of the [`Suite`], nested ones included.
    AfterEach,
}

impl LifecycleKind {
    /// Returns the [`dsl`] function declaring this kind of callback.
    #[must_use]
    pub const fn dsl_name(self) -> &'static str {
        match self {
            Self::BeforeAll => "before_all",
            Self::AfterAll => "after_all",
            Self::BeforeEach => "before_each",
            Self::AfterEach => "after_each",
        }
    }
}

/// Named group of [`Node`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Suite {
    /// Display name of this [`Suite`].
    pub name: String,

    /// Whether this [`Suite`] is skipped entirely.
    pub skip: bool,

    /// Children of this [`Suite`].
    pub nodes: Vec<Node>,
}

impl Suite {
    /// Iterates over the [`LifecycleHook`]s of the given `kind` declared
    /// directly in this [`Suite`].
    pub fn lifecycle(
        &self,
        kind: LifecycleKind,
    ) -> impl Iterator<Item = &Call> + '_ {
        lifecycle(&self.nodes, kind)
    }
}

/// Iterates over the [`LifecycleHook`]s of the given `kind` among `nodes`.
pub(crate) fn lifecycle(
    nodes: &[Node],
    kind: LifecycleKind,
) -> impl Iterator<Item = &Call> + '_ {
    nodes.iter().filter_map(move |n| match n {
        Node::Lifecycle(h) if h.kind == kind => Some(&h.call),
        Node::Lifecycle(_) | Node::Suite(_) | Node::Test(_) => None,
    })
}

/// Single test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Test {
    /// Display name of this [`Test`].
    pub name: String,

    /// What this [`Test`] does.
    pub call: Call,
}

/// Invocation of the core a [`Node`] performs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    /// Applies the hooks of a [`HookPhase`].
    ApplyHooks {
        /// Phase to apply the hooks of.
        phase: HookPhase,

        /// Tags to filter the hooks with. [`None`] disables filtering.
        tags: Option<Vec<String>>,
    },

    /// Dispatches a step.
    RunStep {
        /// JSON serialization of the [`PickleStep`] to dispatch.
        ///
        /// [`PickleStep`]: crate::pickle::PickleStep
        step: String,
    },
}
