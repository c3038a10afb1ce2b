// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Report`] of a [`Program`] run.
//!
//! [`Program`]: crate::program::Program

use std::{borrow::Cow, fmt, rc::Rc};

use console::Style;

use crate::program::LifecycleKind;

/// Outcome of a single test.
#[derive(Clone, Debug)]
pub enum Status {
    /// Test succeeded.
    Passed,

    /// Test, or a callback it depends on, failed.
    Failed(Rc<anyhow::Error>),

    /// Test belongs to a skipped suite.
    Skipped,
}

impl Status {
    /// Indicates whether this is a [`Status::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the error of a [`Status::Failed`].
    #[must_use]
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Passed | Self::Skipped => None,
        }
    }
}

/// Result of a single test.
#[derive(Clone, Debug)]
pub struct TestResult {
    /// Names of the enclosing suites, outermost first.
    pub path: Vec<String>,

    /// Name of the test.
    pub name: String,

    /// Outcome of the test.
    pub status: Status,
}

impl TestResult {
    /// Returns the full name of the test, suite names included.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.path
            .iter()
            .chain([&self.name])
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

/// Failure of a suite-level callback, not attributed to a single test.
#[derive(Clone, Debug)]
pub struct HookFailure {
    /// Names of the suites the callback belongs to, outermost first.
    pub path: Vec<String>,

    /// Kind of the failed callback.
    pub kind: LifecycleKind,

    /// Error of the callback.
    pub error: Rc<anyhow::Error>,
}

/// Results of a [`Program`] run.
///
/// [`Program`]: crate::program::Program
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Results of every test, in execution order.
    pub tests: Vec<TestResult>,

    /// Failed suite-level callbacks, in execution order.
    pub hook_failures: Vec<HookFailure>,
}

impl Report {
    /// Counts [`Status::Passed`] tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, Status::Passed))
    }

    /// Counts [`Status::Failed`] tests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Status::is_failed)
    }

    /// Counts [`Status::Skipped`] tests.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skipped))
    }

    /// Indicates whether nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.hook_failures.is_empty()
    }

    /// Finds a [`TestResult`] by its [full name](TestResult::full_name).
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<&TestResult> {
        self.tests.iter().find(|t| t.full_name() == full_name)
    }

    /// Appends the results of another [`Report`].
    pub fn merge(&mut self, other: Self) {
        self.tests.extend(other.tests);
        self.hook_failures.extend(other.hook_failures);
    }

    /// Renders this [`Report`] with the given [`Styles`].
    #[must_use]
    pub fn render(&self, styles: &Styles) -> String {
        let mut out = Vec::new();
        for t in &self.tests {
            match &t.status {
                Status::Passed => {
                    out.push(styles.ok(format!("✔ {}", t.full_name())));
                }
                Status::Skipped => {
                    out.push(styles.skipped(format!("- {}", t.full_name())));
                }
                Status::Failed(e) => {
                    out.push(styles.err(format!(
                        "✘ {}\n   {}",
                        t.full_name(),
                        format!("{e:#}").replace('\n', "\n   "),
                    )));
                }
            }
        }
        for h in &self.hook_failures {
            out.push(styles.err(format!(
                "✘ {} ({}) failed: {:#}",
                if h.path.is_empty() { "<document>".to_owned() } else { h.path.join(" > ") },
                h.kind.dsl_name(),
                h.error,
            )));
        }
        out.push(styles.bold(format!(
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped(),
        )));
        out.join("\n")
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.tests.iter().filter(|t| pred(&t.status)).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Styles::plain()))
    }
}

/// [`Style`]s of a rendered [`Report`].
#[derive(Clone, Debug)]
pub struct Styles {
    /// [`Style`] for rendering passed tests.
    pub ok: Style,

    /// [`Style`] for rendering skipped tests.
    pub skipped: Style,

    /// [`Style`] for rendering failures.
    pub err: Style,

    /// [`Style`] for rendering __bold__.
    pub bold: Style,

    /// Indicates whether styles are applied at all.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            ok: Style::new().green(),
            skipped: Style::new().cyan(),
            err: Style::new().red(),
            bold: Style::new().bold(),
            is_present: console::Term::stdout().features().is_attended()
                && console::colors_enabled(),
        }
    }
}

impl Styles {
    /// Creates new [`Styles`], applied only when attached to a terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new [`Styles`], never applied.
    #[must_use]
    pub fn plain() -> Self {
        Self { is_present: false, ..Self::default() }
    }

    /// Colors `input` with [`Styles::ok`], if present.
    #[must_use]
    pub fn ok<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.ok, input)
    }

    /// Colors `input` with [`Styles::skipped`], if present.
    #[must_use]
    pub fn skipped<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.skipped, input)
    }

    /// Colors `input` with [`Styles::err`], if present.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.err, input)
    }

    /// Makes `input` __bold__, if present.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.bold, input)
    }

    fn apply<'a>(
        &self,
        style: &Style,
        input: impl Into<Cow<'a, str>>,
    ) -> Cow<'a, str> {
        if self.is_present {
            style.apply_to(input.into()).to_string().into()
        } else {
            input.into()
        }
    }
}
