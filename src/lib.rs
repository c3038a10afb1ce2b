// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Cucumber] step registry, dispatcher and hook orchestrator, lowering
//! [Gherkin] `.feature` files into executable test [`Program`]s.
//!
//! 1. Step definitions and hooks are registered into a [`Registry`], which is
//!    then [frozen](Registry::freeze).
//! 2. `.feature` [`Document`]s are compiled into [`Pickle`]s and
//!    [generated](generate()) into [`Program`]s: one suite per scenario, one
//!    test per step, with hooks wired as lifecycle callbacks.
//! 3. A [`Program`] is either [printed](Program::print) as Rust source, or run
//!    in-process by a [`Runner`], threading a single state value through every
//!    step and hook.
//!
//! [Cucumber]: https://cucumber.io
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(nonstandard_style, rustdoc::broken_intra_doc_links)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(missing_docs, unused_results)]

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;
pub mod data_table;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod generate;
pub mod harness;
pub mod hook;
pub mod host;
pub mod orchestrator;
pub mod parameter;
pub mod pickle;
pub mod program;
pub mod registry;
pub mod step;
pub mod tag;

pub use gherkin;

#[doc(inline)]
pub use self::{
    data_table::{DataTable, Record},
    dispatcher::Dispatcher,
    document::Document,
    error::Error,
    generate::{generate, GenerateError, GenerateOptions},
    harness::{Config, Harness},
    hook::{Hook, HookPhase},
    host::{Report, Runner, Session, Status},
    orchestrator::HookOrchestrator,
    parameter::{Parameter, ParameterKind, Parameters},
    pickle::{Pickle, PickleStep, StepArgument},
    program::Program,
    registry::{RegistrationError, Registry},
    step::StepError,
    tag::TagExpression,
};
