// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of resolving a step text to a single step definition.

use derive_more::with_trait::{Display, Error};

use crate::{parameter::ParameterError, pickle::PickleStep};

use super::location::Location;

/// Step definition matching a step text, listed by [`StepError::Ambiguous`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// Pattern of the step definition.
    pub pattern: String,

    /// Where the step definition was registered.
    pub location: Location,
}

/// Error of dispatching a [`PickleStep`] to its step definition.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum StepError {
    /// No step definition matches the step text.
    #[display(
        "No step definition found for step: \"{text}\"\n\
         Implement with the following snippet:\n\n{}",
        snippet(keyword, text),
    )]
    NotFound {
        /// Presentational keyword of the step (`Given`, `When` or `Then`).
        #[error(not(source))]
        keyword: &'static str,

        /// Text of the step.
        text: String,
    },

    /// More than one step definition matches the step text.
    #[display(
        "Multiple step definitions found for step: \"{keyword}\" \"{text}\"{}",
        candidates_list(candidates),
    )]
    Ambiguous {
        /// Presentational keyword of the step (`Given`, `When` or `Then`).
        #[error(not(source))]
        keyword: &'static str,

        /// Text of the step.
        text: String,

        /// All the matching step definitions, in registration order.
        candidates: Vec<Candidate>,
    },

    /// The only matching step definition captured a value its parameter type
    /// cannot hold.
    #[display(
        "Failed to extract parameters of step \"{keyword}\" \"{text}\": \
         {source}"
    )]
    Parameter {
        /// Presentational keyword of the step (`Given`, `When` or `Then`).
        keyword: &'static str,

        /// Text of the step.
        text: String,

        /// Conversion failure.
        source: ParameterError,
    },
}

impl StepError {
    /// Creates a [`StepError::NotFound`] for the given [`PickleStep`].
    #[must_use]
    pub fn not_found(step: &PickleStep) -> Self {
        Self::NotFound {
            keyword: step.ty.keyword(),
            text: step.text.clone(),
        }
    }

    /// Creates a [`StepError::Ambiguous`] for the given [`PickleStep`].
    #[must_use]
    pub fn ambiguous(step: &PickleStep, candidates: Vec<Candidate>) -> Self {
        Self::Ambiguous {
            keyword: step.ty.keyword(),
            text: step.text.clone(),
            candidates,
        }
    }

    /// Returns the text of the failed step.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::NotFound { text, .. }
            | Self::Ambiguous { text, .. }
            | Self::Parameter { text, .. } => text,
        }
    }

    /// Returns a ready-to-paste step definition for a [`StepError::NotFound`]
    /// step.
    ///
    /// The step text is escaped, so the snippet's pattern matches it
    /// literally.
    #[must_use]
    pub fn snippet(&self) -> Option<String> {
        let Self::NotFound { keyword, text } = self else {
            return None;
        };
        Some(snippet(keyword, text))
    }
}

/// Formats a step definition stub for the given step.
fn snippet(keyword: &str, text: &str) -> String {
    format!(
        "registry.{}({:?}, |state, _params, _arg| async move {{\n    \
             anyhow::Ok(state)\n\
         }})?;",
        keyword.to_lowercase(),
        escape(text),
    )
}

/// Escapes every character of the `text` having a meaning in a Cucumber
/// Expression.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '{' | '}' | '(' | ')' | '/') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Lists the `candidates`, one per line.
fn candidates_list(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("\n{} --> {}", c.pattern, c.location))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pickle::PickleStepType, step::matcher::Matcher};

    fn step(ty: PickleStepType, text: &str) -> PickleStep {
        PickleStep { text: text.into(), ty, argument: None }
    }

    #[test]
    fn not_found_embeds_text_keyword_and_snippet() {
        let err = StepError::not_found(&step(
            PickleStepType::Action,
            r#"I push "x""#,
        ));
        let msg = err.to_string();

        assert!(msg.contains(r#"No step definition found for step: "I push "x"""#));
        assert!(msg.contains(r#"registry.when("I push \"x\"", "#), "{msg}");
        assert!(msg.contains("anyhow::Ok(state)"), "{msg}");
    }

    #[test]
    fn snippet_pattern_matches_step_text_literally() {
        let text = r"I pay {5} (now) to a/b \ c";
        let err = StepError::not_found(&step(PickleStepType::Context, text));

        let snippet = err.snippet().unwrap();
        assert!(
            snippet.starts_with(
                r#"registry.given("I pay \\{5\\} \\(now\\) to a\\/b \\\\ c", "#,
            ),
            "{snippet}",
        );

        let m = Matcher::compile(escape(text)).unwrap();
        assert!(m.kinds().is_empty());
        assert!(m.is_match(text));
    }

    #[test]
    fn unknown_step_type_is_presented_as_given() {
        let err =
            StepError::not_found(&step(PickleStepType::Unknown, "anything"));

        assert_eq!(
            err,
            StepError::NotFound { keyword: "Given", text: "anything".into() },
        );
        assert!(err.snippet().unwrap().starts_with("registry.given("));
    }

    #[test]
    fn ambiguous_lists_every_candidate() {
        let err = StepError::ambiguous(
            &step(PickleStepType::Outcome, "I have 5 cucumbers"),
            vec![
                Candidate {
                    pattern: "I have {int} cucumbers".into(),
                    location: Location::new("tests/steps.rs", 10, 5),
                },
                Candidate {
                    pattern: "I have {} cucumbers".into(),
                    location: Location::new("tests/steps.rs", 20, 5),
                },
            ],
        );
        let msg = err.to_string();

        assert!(msg.starts_with(
            r#"Multiple step definitions found for step: "Then" "I have 5 cucumbers""#,
        ));
        assert!(msg.contains("I have {int} cucumbers --> tests/steps.rs:10:5"));
        assert!(msg.contains("I have {} cucumbers --> tests/steps.rs:20:5"));
        assert!(err.snippet().is_none());
    }
}
