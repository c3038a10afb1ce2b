// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lowering of a [`Document`] and its [`Pickle`]s into a [`Program`].

use std::collections::HashMap;

use derive_more::with_trait::{Display, Error, From};

use crate::{
    document::{Document, LoadError},
    hook::HookPhase,
    pickle::{ExpandExamplesError, Pickle},
    program::{dsl, Node, Program},
    tag::TagExpression,
};

/// Options of [`generate()`].
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Verbatim header of the printed source, importing step definitions.
    pub imports: String,

    /// Tag expression selecting the scenarios to run. The rest are emitted
    /// skipped.
    pub tag_expression: Option<TagExpression>,
}

/// Generates a [`Program`] out of the given [`Document`] and its [`Pickle`]s.
///
/// The [`Program`] consists of:
/// - document-level [`HookPhase::BeforeAll`] and [`HookPhase::AfterAll`]
///   callbacks, applying all the hooks of those phases unfiltered;
/// - a suite named after the feature (or the document URI), with a nested
///   suite per [`Pickle`], applying [`HookPhase::Before`],
///   [`HookPhase::After`], [`HookPhase::BeforeStep`] and
///   [`HookPhase::AfterStep`] hooks filtered by the [`Pickle`]'s tags, and a
///   test per step.
///
/// # Errors
///
/// If the feature name is empty, or a step cannot be serialized.
pub fn generate(
    doc: &Document,
    pickles: &[Pickle],
    opts: &GenerateOptions,
) -> Result<Program, GenerateError> {
    let fail = |kind| GenerateError { path: doc.uri.clone(), kind };

    let feature_name = doc.feature_name().unwrap_or(&doc.uri);
    if feature_name.is_empty() {
        return Err(fail(GenerateErrorKind::MissingFeatureName));
    }

    let names = display_names(pickles);
    let scenarios = pickles
        .iter()
        .zip(names)
        .map(|(pickle, name)| {
            scenario(pickle, &name, opts.tag_expression.as_ref())
                .map_err(|e| fail(e.into()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        uri = %doc.uri,
        scenarios = scenarios.len(),
        "generated program",
    );

    Ok(dsl::program(
        &doc.uri,
        &opts.imports,
        vec![
            dsl::before_all(dsl::apply_hooks(HookPhase::BeforeAll)),
            dsl::after_all(dsl::apply_hooks(HookPhase::AfterAll)),
            dsl::describe(feature_name, scenarios),
        ],
    ))
}

/// Generates a [`Program`] and [prints](Program::print) it.
///
/// # Errors
///
/// See [`generate()`] for details.
pub fn generate_source(
    doc: &Document,
    pickles: &[Pickle],
    opts: &GenerateOptions,
) -> Result<String, GenerateError> {
    generate(doc, pickles, opts).map(|p| p.print())
}

/// Lowers a single [`Pickle`] into a suite.
fn scenario(
    pickle: &Pickle,
    name: &str,
    filter: Option<&TagExpression>,
) -> Result<Node, serde_json::Error> {
    let tags = pickle.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    let skip = filter.is_some_and(|f| !f.eval(&tags));

    let mut nodes = vec![
        dsl::before_all(dsl::apply_tagged_hooks(HookPhase::Before, &tags)),
        dsl::after_all(dsl::apply_tagged_hooks(HookPhase::After, &tags)),
        dsl::before_each(dsl::apply_tagged_hooks(HookPhase::BeforeStep, &tags)),
        dsl::after_each(dsl::apply_tagged_hooks(HookPhase::AfterStep, &tags)),
    ];
    for step in &pickle.steps {
        nodes.push(dsl::it(&step.text, dsl::run_step(&step.to_json()?)));
    }

    Ok(if skip {
        dsl::describe_skip(name, nodes)
    } else {
        dsl::describe(name, nodes)
    })
}

/// Computes display names of the given [`Pickle`]s.
///
/// A name shared by several [`Pickle`]s is prefixed with its 1-based
/// occurrence counter among them.
fn display_names(pickles: &[Pickle]) -> Vec<String> {
    let mut totals = HashMap::<&str, usize>::new();
    for p in pickles {
        *totals.entry(&p.name).or_default() += 1;
    }

    let mut seen = HashMap::<&str, usize>::new();
    pickles
        .iter()
        .map(|p| {
            if totals.get(p.name.as_str()).copied().unwrap_or_default() > 1 {
                let n = seen.entry(&p.name).or_default();
                *n += 1;
                format!("{n}. {}", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect()
}

/// Error of generating a [`Program`] for a document.
#[derive(Debug, Display, Error)]
#[display("Failed to generate test file for: {path}")]
pub struct GenerateError {
    /// URI of the document.
    #[error(not(source))]
    pub path: String,

    /// What went wrong.
    #[error(source)]
    pub kind: GenerateErrorKind,
}

/// Cause of a [`GenerateError`].
#[derive(Debug, Display, Error, From)]
pub enum GenerateErrorKind {
    /// Document has neither a feature name nor a URI.
    #[display("Feature name is missing")]
    MissingFeatureName,

    /// Document cannot be loaded.
    #[display("{_0}")]
    Load(LoadError),

    /// [`Scenario Outline`][1] cannot be expanded.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    #[display("{_0}")]
    Examples(ExpandExamplesError),

    /// Step cannot be serialized.
    #[display("Failed to serialize step: {_0}")]
    Serialize(serde_json::Error),
}
