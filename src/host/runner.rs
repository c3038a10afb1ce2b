// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sequential [`Runner`] of [`Program`]s.

use std::{collections::HashMap, rc::Rc};

use tracing::Instrument as _;

use crate::program::{lifecycle, Call, LifecycleKind, Node, Program};

use super::{
    report::{HookFailure, Report, Status, TestResult},
    Session,
};

/// Runs [`Program`]s one [`Node`] at a time, threading the state of its
/// [`Session`] through every [`Call`].
///
/// Execution order within a suite:
/// 1. its `before_all` callbacks, once, even if it has no tests;
/// 2. its children in declaration order, every test being surrounded by the
///    `before_each` callbacks of all its enclosing suites (outermost first)
///    and their `after_each` callbacks (innermost first);
/// 3. its `after_all` callbacks, once, even if something failed before.
///
/// A failing `before_all` callback fails every test of its suite without
/// running them. A skipped suite runs no callbacks at all, and reports its
/// tests as [`Status::Skipped`].
///
/// `S: Clone` comes from the [`Session`], which keeps the last good state of
/// a failed [`Call`].
#[derive(Debug)]
pub struct Runner<S> {
    session: Session<S>,
}

impl<S: Clone + Default + 'static> Runner<S> {
    /// Creates a new [`Runner`] performing [`Call`]s with the given
    /// [`Session`].
    #[must_use]
    pub const fn new(session: Session<S>) -> Self {
        Self { session }
    }

    /// Runs the given [`Program`].
    pub async fn run(&mut self, program: &Program) -> Report {
        let span = tracing::info_span!("program", source = %program.source);
        self.execute(plan(program)).instrument(span).await
    }

    /// Returns the [`Session`] of this [`Runner`].
    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Consumes this [`Runner`], returning its [`Session`].
    #[must_use]
    pub fn into_session(self) -> Session<S> {
        self.session
    }

    async fn execute(&mut self, ops: Vec<Op<'_>>) -> Report {
        let mut report = Report::default();
        let mut failed_suites = HashMap::<usize, Rc<anyhow::Error>>::new();

        for op in ops {
            match op {
                Op::SuiteHook { suite, path, kind, call } => {
                    if let Err(e) = self.session.call(call).await {
                        tracing::debug!(
                            suite = %path.join(" > "),
                            kind = kind.dsl_name(),
                            error = %e,
                            "suite callback failed",
                        );
                        let e = Rc::new(e);
                        if kind == LifecycleKind::BeforeAll {
                            _ = failed_suites.entry(suite).or_insert_with(|| Rc::clone(&e));
                        }
                        report.hook_failures.push(HookFailure { path, kind, error: e });
                    }
                }
                Op::Skip { path, name } => {
                    report.tests.push(TestResult { path, name, status: Status::Skipped });
                }
                Op::Test { suites, path, name, call, before_each, after_each } => {
                    let status = if let Some(e) =
                        suites.iter().find_map(|id| failed_suites.get(id))
                    {
                        Status::Failed(Rc::clone(e))
                    } else {
                        let scenario =
                            tracing::info_span!("scenario", path = %path.join(" > "));
                        let step =
                            tracing::info_span!(parent: &scenario, "step", name = %name);
                        self.test(call, &before_each, &after_each)
                            .instrument(step)
                            .await
                    };
                    report.tests.push(TestResult { path, name, status });
                }
            }
        }
        report
    }

    async fn test(
        &mut self,
        call: &Call,
        before_each: &[&Call],
        after_each: &[&Call],
    ) -> Status {
        let mut error = None;

        for c in before_each {
            if let Err(e) = self.session.call(c).await {
                error = Some(e);
                break;
            }
        }
        if error.is_none() {
            error = self.session.call(call).await.err();
        }
        for c in after_each {
            if let Err(e) = self.session.call(c).await {
                _ = error.get_or_insert(e);
            }
        }

        match error {
            None => Status::Passed,
            Some(e) => {
                tracing::debug!(error = %e, "test failed");
                Status::Failed(Rc::new(e))
            }
        }
    }
}

/// Single operation of a flattened [`Program`].
enum Op<'p> {
    /// Suite-level callback.
    SuiteHook {
        suite: usize,
        path: Vec<String>,
        kind: LifecycleKind,
        call: &'p Call,
    },

    /// Test of a skipped suite.
    Skip { path: Vec<String>, name: String },

    /// Test to run.
    Test {
        /// Enclosing suites, outermost first.
        suites: Vec<usize>,
        path: Vec<String>,
        name: String,
        call: &'p Call,
        before_each: Vec<&'p Call>,
        after_each: Vec<&'p Call>,
    },
}

/// Scope of the [`Program`] being flattened.
struct Scope<'p> {
    id: usize,
    nodes: &'p [Node],
}

/// Flattens the given [`Program`] into execution order.
fn plan(program: &Program) -> Vec<Op<'_>> {
    let mut ops = Vec::new();
    let mut next_id = 0;
    plan_suite(
        &mut ops,
        &mut next_id,
        &mut vec![],
        &mut vec![],
        &program.nodes,
        false,
    );
    ops
}

fn plan_suite<'p>(
    ops: &mut Vec<Op<'p>>,
    next_id: &mut usize,
    scopes: &mut Vec<Scope<'p>>,
    path: &mut Vec<String>,
    nodes: &'p [Node],
    skip: bool,
) {
    let id = *next_id;
    *next_id += 1;
    scopes.push(Scope { id, nodes });

    if !skip {
        for call in lifecycle(nodes, LifecycleKind::BeforeAll) {
            ops.push(Op::SuiteHook {
                suite: id,
                path: path.clone(),
                kind: LifecycleKind::BeforeAll,
                call,
            });
        }
    }

    for node in nodes {
        match node {
            Node::Lifecycle(_) => {}
            Node::Test(t) if skip => {
                ops.push(Op::Skip { path: path.clone(), name: t.name.clone() });
            }
            Node::Test(t) => ops.push(Op::Test {
                suites: scopes.iter().map(|s| s.id).collect(),
                path: path.clone(),
                name: t.name.clone(),
                call: &t.call,
                before_each: scopes
                    .iter()
                    .flat_map(|s| lifecycle(s.nodes, LifecycleKind::BeforeEach))
                    .collect(),
                after_each: scopes
                    .iter()
                    .rev()
                    .flat_map(|s| lifecycle(s.nodes, LifecycleKind::AfterEach))
                    .collect(),
            }),
            Node::Suite(s) => {
                path.push(s.name.clone());
                plan_suite(ops, next_id, scopes, path, &s.nodes, skip || s.skip);
                _ = path.pop();
            }
        }
    }

    if !skip {
        for call in lifecycle(nodes, LifecycleKind::AfterAll) {
            ops.push(Op::SuiteHook {
                suite: id,
                path: path.clone(),
                kind: LifecycleKind::AfterAll,
                call,
            });
        }
    }

    _ = scopes.pop();
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use futures::executor::block_on;

    use super::*;
    use crate::{program::dsl::*, Hook, Registry};

    type Log = Rc<RefCell<Vec<String>>>;

    /// Registers a step `{word}` logging the word, and hooks of every phase
    /// logging the phase.
    fn runner(log: &Log) -> Runner<u32> {
        let mut registry = Registry::new();
        let l = Rc::clone(log);
        _ = registry
            .step("{word}", move |n: u32, p, _| {
                let word = p.string(0).map(str::to_owned);
                let l = Rc::clone(&l);
                async move {
                    let word = word?;
                    l.borrow_mut().push(word.clone());
                    anyhow::ensure!(word != "fail", "step failed");
                    Ok(n + 1)
                }
            })
            .unwrap();
        for phase in HookPhase::ALL {
            let l = Rc::clone(log);
            _ = registry
                .hook(
                    phase,
                    Hook::new(move |n: u32| {
                        l.borrow_mut().push(phase.to_string());
                        async move { anyhow::Ok(n) }
                    }),
                )
                .unwrap();
        }
        Runner::new(Session::new(registry.freeze()))
    }

    fn step(word: &str) -> Call {
        run_step(&format!(r#"{{"text":"{word}","type":"Context"}}"#))
    }

    #[test]
    fn runs_callbacks_in_lifecycle_order() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![
            before_all(apply_hooks(HookPhase::BeforeAll)),
            after_all(apply_hooks(HookPhase::AfterAll)),
            describe("Feature", vec![
                describe("Scenario", vec![
                    before_all(apply_tagged_hooks(HookPhase::Before, &[])),
                    after_all(apply_tagged_hooks(HookPhase::After, &[])),
                    before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),
                    after_each(apply_tagged_hooks(HookPhase::AfterStep, &[])),
                    it("one", step("one")),
                    it("two", step("two")),
                ]),
            ]),
        ]);

        let report = block_on(r.run(&program));

        assert!(report.is_success(), "{report}");
        assert_eq!(
            *log.borrow(),
            [
                "beforeAll", "before", "beforeStep", "one", "afterStep",
                "beforeStep", "two", "afterStep", "after", "afterAll",
            ],
        );
        assert_eq!(*r.session().state(), 2);
        assert_eq!(report.tests[1].full_name(), "Feature > Scenario > two");
    }

    #[test]
    fn nests_each_callbacks() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![
            before_each(step("outer_before")),
            after_each(step("outer_after")),
            describe("inner", vec![
                before_each(step("inner_before")),
                after_each(step("inner_after")),
                it("test", step("test")),
            ]),
        ]);

        let report = block_on(r.run(&program));

        assert!(report.is_success(), "{report}");
        assert_eq!(
            *log.borrow(),
            ["outer_before", "inner_before", "test", "inner_after", "outer_after"],
        );
    }

    #[test]
    fn skipped_suites_run_nothing() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![
            describe_skip("skipped", vec![
                before_all(step("before")),
                after_all(step("after")),
                it("a", step("a")),
                describe("nested", vec![it("b", step("b"))]),
            ]),
            describe("run", vec![it("c", step("c"))]),
        ]);

        let report = block_on(r.run(&program));

        assert_eq!((report.skipped(), report.passed()), (2, 1));
        assert_eq!(*log.borrow(), ["c"]);
        assert!(matches!(
            report.get("skipped > nested > b").unwrap().status,
            Status::Skipped,
        ));
    }

    #[test]
    fn failing_before_all_fails_its_tests_only() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![
            describe("broken", vec![
                before_all(step("fail")),
                after_all(step("cleanup")),
                it("a", step("a")),
                it("b", step("b")),
            ]),
            describe("fine", vec![it("c", step("c"))]),
        ]);

        let report = block_on(r.run(&program));

        assert_eq!((report.failed(), report.passed()), (2, 1));
        assert_eq!(report.hook_failures.len(), 1);
        assert_eq!(*log.borrow(), ["fail", "cleanup", "c"]);
        assert_eq!(
            report.get("broken > a").unwrap().status.error().unwrap().to_string(),
            "step failed",
        );
    }

    #[test]
    fn failures_do_not_stop_later_units() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![
            describe("scenario", vec![
                after_all(step("after")),
                after_each(step("each")),
                it("one", step("fail")),
                it("two", step("two")),
                it("missing", run_step(r#"{"text":"no such step","type":"Outcome"}"#)),
            ]),
        ]);

        let report = block_on(r.run(&program));

        assert_eq!((report.failed(), report.passed()), (2, 1));
        assert_eq!(*log.borrow(), ["fail", "each", "two", "each", "each", "after"]);
        assert!(report
            .get("scenario > missing")
            .and_then(|t| t.status.error())
            .and_then(|e| e.downcast_ref::<crate::StepError>())
            .is_some());
        // Only successful steps advance the state.
        assert_eq!(*r.session().state(), 5);
    }

    #[test]
    fn suite_before_all_runs_without_tests() {
        let log = Log::default();
        let mut r = runner(&log);
        let program = program("doc", "", vec![describe("empty", vec![
            before_all(step("before")),
            after_all(step("after")),
        ])]);

        let report = block_on(r.run(&program));

        assert!(report.tests.is_empty());
        assert_eq!(*log.borrow(), ["before", "after"]);
    }
}
