// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-process host executing generated [`Program`]s.
//!
//! [`Program`]: crate::program::Program

pub mod report;
pub mod runner;
pub mod session;

#[doc(inline)]
pub use self::{
    report::{HookFailure, Report, Status, Styles, TestResult},
    runner::Runner,
    session::Session,
};
