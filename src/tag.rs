// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Tag expressions][1] filtering hooks and scenarios.
//!
//! [1]: https://cucumber.io/docs/cucumber/api#tag-expressions

use std::str::FromStr;

use derive_more::with_trait::{Display, Error};
use gherkin::tagexpr::TagOperation;
use sealed::sealed;

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// A leading `@` is insignificant on both sides.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                let t = bare(t);
                tags.into_iter().any(|tag| bare(tag.as_ref()) == t)
            }
        }
    }
}

fn bare(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

/// Compiled tag expression.
///
/// ```rust
/// # use cucumber_harness::tag::TagExpression;
/// let expr: TagExpression = "@a and not @b".parse().unwrap();
///
/// assert!(expr.eval(["@a"]));
/// assert!(!expr.eval(["@a", "@b"]));
/// ```
#[derive(Clone, Debug, Display)]
#[display("{source}")]
pub struct TagExpression {
    source: String,
    op: TagOperation,
}

impl TagExpression {
    /// Parses the given tag expression.
    ///
    /// # Errors
    ///
    /// If the `expression` is malformed.
    pub fn parse(expression: impl Into<String>) -> Result<Self, TagExpressionError> {
        let source = expression.into();
        let op = source.parse::<TagOperation>().map_err(|e| {
            TagExpressionError { expression: source.clone(), reason: e.to_string() }
        })?;
        Ok(Self { source, op })
    }

    /// Returns the text this [`TagExpression`] was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates this [`TagExpression`] against the given tag names.
    #[must_use]
    pub fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.op.eval(tags)
    }
}

impl FromStr for TagExpression {
    type Err = TagExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error of parsing a malformed tag expression.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Invalid tag expression `{expression}`: {reason}")]
pub struct TagExpressionError {
    /// Offending expression.
    #[error(not(source))]
    pub expression: String,

    /// Why parsing failed.
    pub reason: String,
}
