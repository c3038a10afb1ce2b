// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions and their [`Collection`].

pub mod collection;
pub mod error;
pub mod location;
pub mod matcher;

use derive_more::with_trait::Debug;
use futures::future::LocalBoxFuture;

use crate::{parameter::Parameters, pickle::StepArgument};

#[doc(inline)]
pub use self::{
    collection::Collection,
    error::{Candidate, StepError},
    location::Location,
    matcher::{Matcher, PatternError},
};

/// Type-erased step handler.
///
/// Receives the current state, the [`Parameters`] extracted from the step
/// text and the step's [`StepArgument`], resolving into the next state.
pub type StepFn<S> = Box<
    dyn Fn(
        S,
        Parameters,
        Option<StepArgument>,
    ) -> LocalBoxFuture<'static, anyhow::Result<S>>,
>;

/// Registered step definition.
#[derive(Debug)]
pub struct StepDefinition<S> {
    /// Compiled pattern of this [`StepDefinition`].
    pub matcher: Matcher,

    /// Handler invoked when the [`StepDefinition::matcher`] matches.
    #[debug(skip)]
    pub handler: StepFn<S>,

    /// Where this [`StepDefinition`] was registered.
    pub location: Location,
}

impl<S> StepDefinition<S> {
    /// Returns the pattern this [`StepDefinition`] was registered with.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }
}
