// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Declaration API of [`Program`]s, called by printed sources.
//!
//! ```rust
//! use cucumber_harness::program::dsl::*;
//!
//! let p = program("counter.feature", "", vec![
//!     before_all(apply_hooks(HookPhase::BeforeAll)),
//!     describe("Counter", vec![
//!         before_all(apply_tagged_hooks(HookPhase::Before, &["@counter"])),
//!         it("Given the counter is 0", run_step(r#"{"text":"the counter is 0","type":"Context"}"#)),
//!     ]),
//!     after_all(apply_hooks(HookPhase::AfterAll)),
//! ]);
//! assert_eq!(p.count_tests(), 1);
//! ```

pub use crate::hook::HookPhase;

use super::{Call, LifecycleHook, LifecycleKind, Node, Program, Suite, Test};

/// Declares a [`Program`].
#[must_use]
pub fn program(source: &str, imports: &str, nodes: Vec<Node>) -> Program {
    Program { source: source.to_owned(), imports: imports.to_owned(), nodes }
}

/// Declares a [`Suite`].
#[must_use]
pub fn describe(name: &str, nodes: Vec<Node>) -> Node {
    Node::Suite(Suite { name: name.to_owned(), skip: false, nodes })
}

/// Declares a skipped [`Suite`].
#[must_use]
pub fn describe_skip(name: &str, nodes: Vec<Node>) -> Node {
    Node::Suite(Suite { name: name.to_owned(), skip: true, nodes })
}

/// Declares a [`LifecycleKind::BeforeAll`] callback.
#[must_use]
pub fn before_all(call: Call) -> Node {
    lifecycle(LifecycleKind::BeforeAll, call)
}

/// Declares a [`LifecycleKind::AfterAll`] callback.
#[must_use]
pub fn after_all(call: Call) -> Node {
    lifecycle(LifecycleKind::AfterAll, call)
}

/// Declares a [`LifecycleKind::BeforeEach`] callback.
#[must_use]
pub fn before_each(call: Call) -> Node {
    lifecycle(LifecycleKind::BeforeEach, call)
}

/// Declares a [`LifecycleKind::AfterEach`] callback.
#[must_use]
pub fn after_each(call: Call) -> Node {
    lifecycle(LifecycleKind::AfterEach, call)
}

/// Declares a [`Test`].
#[must_use]
pub fn it(name: &str, call: Call) -> Node {
    Node::Test(Test { name: name.to_owned(), call })
}

/// Applies all the hooks of the given `phase`, unfiltered.
#[must_use]
pub const fn apply_hooks(phase: HookPhase) -> Call {
    Call::ApplyHooks { phase, tags: None }
}

/// Applies the hooks of the given `phase` whose tag filters accept the given
/// `tags`.
#[must_use]
pub fn apply_tagged_hooks(phase: HookPhase, tags: &[&str]) -> Call {
    Call::ApplyHooks {
        phase,
        tags: Some(tags.iter().copied().map(str::to_owned).collect()),
    }
}

/// Dispatches the step serialized as the given JSON.
#[must_use]
pub fn run_step(json: &str) -> Call {
    Call::RunStep { step: json.to_owned() }
}

fn lifecycle(kind: LifecycleKind, call: Call) -> Node {
    Node::Lifecycle(LifecycleHook { kind, call })
}
