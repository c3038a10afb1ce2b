// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Flattened, executable form of [`gherkin::Scenario`]s.
//!
//! A [`Pickle`] is a single scenario with its backgrounds prepended, its
//! [`Scenario Outline`][1] placeholders substituted, and its tags inherited
//! from every enclosing element.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline

use std::{iter, mem};

use derive_more::with_trait::{Display, Error};
use itertools::Itertools as _;
use lazy_regex::regex;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data_table::DataTable;

/// Single executable scenario.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickle {
    /// Identifier, unique within its document.
    pub id: String,

    /// URI of the document this [`Pickle`] was compiled from.
    pub uri: String,

    /// Name of the scenario, with placeholders substituted.
    pub name: String,

    /// Line of the scenario (or of the [`Examples`] row it was expanded from).
    ///
    /// [`Examples`]: gherkin::Examples
    pub line: usize,

    /// All the inherited tags, in feature, rule, scenario, examples order.
    pub tags: Vec<Tag>,

    /// Steps to execute, backgrounds first.
    pub steps: Vec<PickleStep>,
}

impl Pickle {
    /// Returns names of this [`Pickle`]'s [`Tag`]s.
    #[must_use]
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}

/// Tag of a [`Pickle`].
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[display("{name}")]
pub struct Tag {
    /// Name of the tag, including the leading `@`.
    pub name: String,
}

impl Tag {
    /// Creates a new [`Tag`], prepending `@` if it's missing.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self { name: format!("@{}", name.strip_prefix('@').unwrap_or(name)) }
    }
}

/// Single step of a [`Pickle`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickleStep {
    /// Text of the step, without its keyword.
    pub text: String,

    /// Semantic type of the step.
    #[serde(rename = "type")]
    pub ty: PickleStepType,

    /// Attached data table or doc string, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<StepArgument>,
}

impl PickleStep {
    /// Serializes this [`PickleStep`] into JSON.
    ///
    /// # Errors
    ///
    /// Never in practice, as every field is representable in JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserializes a [`PickleStep`] from JSON.
    ///
    /// # Errors
    ///
    /// If the `json` isn't a valid [`PickleStep`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Semantic type of a [`PickleStep`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PickleStepType {
    /// Step setting up the context (`Given`).
    Context,

    /// Step performing an action (`When`).
    Action,

    /// Step checking an outcome (`Then`).
    Outcome,

    /// Step whose type couldn't be determined.
    #[serde(other)]
    Unknown,
}

impl PickleStepType {
    /// Returns the keyword this [`PickleStepType`] is presented with.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Context | Self::Unknown => "Given",
            Self::Action => "When",
            Self::Outcome => "Then",
        }
    }
}

impl From<gherkin::StepType> for PickleStepType {
    fn from(ty: gherkin::StepType) -> Self {
        match ty {
            gherkin::StepType::Given => Self::Context,
            gherkin::StepType::When => Self::Action,
            gherkin::StepType::Then => Self::Outcome,
        }
    }
}

/// Payload attached to a [`PickleStep`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepArgument {
    /// [Data table][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#data-tables
    DataTable(DataTable),

    /// [Doc string][1].
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#doc-strings
    DocString(DocString),
}

impl StepArgument {
    /// Returns the [`DataTable`], if this is one.
    #[must_use]
    pub const fn data_table(&self) -> Option<&DataTable> {
        match self {
            Self::DataTable(t) => Some(t),
            Self::DocString(_) => None,
        }
    }

    /// Returns the [`DocString`] content, if this is one.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        match self {
            Self::DocString(d) => Some(&d.content),
            Self::DataTable(_) => None,
        }
    }
}

/// [Doc string][1] attached to a [`PickleStep`].
///
/// [1]: https://cucumber.io/docs/gherkin/reference#doc-strings
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DocString {
    /// Content of the doc string.
    pub content: String,
}

/// Compiles the given [`gherkin::Feature`] into [`Pickle`]s, in document
/// order.
///
/// The `source` the `feature` was parsed from locates [`Examples`] rows.
///
/// # Errors
///
/// If a [`Scenario Outline`][1] refers to a placeholder its [`Examples`] don't
/// declare.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
/// [`Examples`]: gherkin::Examples
pub fn compile(
    feature: &gherkin::Feature,
    uri: &str,
    source: &str,
) -> Result<Vec<Pickle>, ExpandExamplesError> {
    let feature_steps = feature.background.iter().flat_map(|b| &b.steps);

    let scenarios = feature
        .scenarios
        .iter()
        .map(|s| (None, s))
        .chain(
            feature
                .rules
                .iter()
                .flat_map(|r| r.scenarios.iter().map(move |s| (Some(r), s))),
        )
        .sorted_by_key(|(_, s)| s.position.line);

    let mut pickles = Vec::new();
    for (rule, scenario) in scenarios {
        let background = feature_steps
            .clone()
            .chain(rule.into_iter().flat_map(|r| &r.background).flat_map(|b| &b.steps))
            .cloned()
            .collect::<Vec<_>>();
        let tags = feature
            .tags
            .iter()
            .chain(rule.into_iter().flat_map(|r| &r.tags))
            .chain(&scenario.tags)
            .map(Tag::new)
            .collect::<Vec<_>>();

        for expanded in expand_scenario(scenario, uri, source) {
            let Expanded { name, line, steps, tags: example_tags } = expanded?;
            pickles.push(Pickle {
                id: format!("{uri}#{}", pickles.len()),
                uri: uri.to_owned(),
                name,
                line,
                tags: tags
                    .iter()
                    .cloned()
                    .chain(example_tags.iter().map(Tag::new))
                    .collect(),
                steps: background.iter().chain(&steps).map(pickle_step).collect(),
            });
        }
    }
    Ok(pickles)
}

/// [`gherkin::Scenario`] with a single [`Examples`] row substituted.
///
/// [`Examples`]: gherkin::Examples
struct Expanded {
    name: String,
    line: usize,
    steps: Vec<gherkin::Step>,
    tags: Vec<String>,
}

/// Expands [`gherkin::Scenario`] [`Examples`], if any.
///
/// [`Examples`]: gherkin::Examples
fn expand_scenario(
    scenario: &gherkin::Scenario,
    uri: &str,
    source: &str,
) -> Vec<Result<Expanded, ExpandExamplesError>> {
    /// [`Regex`] matching placeholders [`Examples`] should expand into.
    ///
    /// [`Examples`]: gherkin::Examples
    static TEMPLATE_REGEX: &Lazy<Regex> = regex!(r"<([^>\s]+)>");

    if scenario.examples.is_empty() {
        return vec![Ok(Expanded {
            name: scenario.name.clone(),
            line: scenario.position.line,
            steps: scenario.steps.clone(),
            tags: Vec::new(),
        })];
    }

    scenario
        .examples
        .iter()
        .filter_map(|ex| {
            ex.table
                .as_ref()?
                .rows
                .split_first()
                .map(|(header, rows)| (header, rows, ex))
        })
        .flat_map(|(header, rows, ex)| {
            let lines = table_row_lines(source, ex.position.line);
            rows.iter().enumerate().map(move |(id, row)| {
                let line = lines
                    .get(id + 1)
                    .copied()
                    .unwrap_or(ex.position.line + id + 2);
                (header, row, ex, line)
            })
        })
        .map(|(header, row, ex, line)| {
            let substitute = |text: &str| -> Result<String, ExpandExamplesError> {
                let mut err = None;
                let replaced = TEMPLATE_REGEX
                    .replace_all(text, |cap: &regex::Captures<'_>| {
                        let name = cap.get(1).map_or("", |m| m.as_str());
                        header
                            .iter()
                            .zip(row)
                            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
                            .unwrap_or_else(|| {
                                err = Some(ExpandExamplesError {
                                    uri: uri.to_owned(),
                                    line,
                                    name: name.to_owned(),
                                });
                                ""
                            })
                    })
                    .into_owned();
                err.map_or(Ok(replaced), Err)
            };

            let mut steps = scenario.steps.clone();
            for s in &mut steps {
                for value in iter::once(&mut s.value)
                    .chain(s.docstring.iter_mut())
                    .chain(s.table.iter_mut().flat_map(|t| {
                        t.rows.iter_mut().flat_map(|r| r.iter_mut())
                    }))
                {
                    *value = substitute(&mem::take(value))?;
                }
            }

            Ok(Expanded {
                name: substitute(&scenario.name)?,
                line,
                steps,
                tags: ex.tags.clone(),
            })
        })
        .collect()
}

/// Returns the lines of the table rows following the `Examples:` keyword at
/// the given `line`, header row included.
///
/// Blank and comment lines may separate the rows.
fn table_row_lines(source: &str, line: usize) -> Vec<usize> {
    let mut rows = Vec::new();
    for (n, text) in source.lines().enumerate().skip(line) {
        let text = text.trim_start();
        if text.starts_with('|') {
            rows.push(n + 1);
        } else if !rows.is_empty() && !text.is_empty() && !text.starts_with('#')
        {
            break;
        }
    }
    rows
}

fn pickle_step(step: &gherkin::Step) -> PickleStep {
    let argument = step
        .table
        .as_ref()
        .map(|t| StepArgument::DataTable(DataTable::from(t)))
        .or_else(|| {
            step.docstring.as_ref().map(|content| {
                StepArgument::DocString(DocString { content: content.clone() })
            })
        });

    PickleStep {
        text: step.value.clone(),
        ty: step.ty.into(),
        argument,
    }
}

/// Error of [`Scenario Outline`][1] expansion encountering an unknown
/// placeholder.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Failed to resolve <{name}> at {uri}:{line}")]
pub struct ExpandExamplesError {
    /// URI of the document.
    #[error(not(source))]
    pub uri: String,

    /// Line of the [`Examples`] row being substituted.
    ///
    /// [`Examples`]: gherkin::Examples
    pub line: usize,

    /// Name of the unknown placeholder.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use gherkin::GherkinEnv;

    use super::*;

    fn compiled(
        input: &str,
        uri: &str,
    ) -> Result<Vec<Pickle>, ExpandExamplesError> {
        let feature =
            gherkin::Feature::parse(input, GherkinEnv::default()).unwrap();
        compile(&feature, uri, input)
    }

    #[test]
    fn prepends_backgrounds_and_merges_tags() {
        let pickles = compiled(
            "@shop\n\
             Feature: Basket\n\
             \n  Background:\n    Given an empty basket\n\
             \n  @fast\n  Scenario: adding\n    When I add an apple\n    Then I have 1 item\n\
             \n  @slow\n  Rule: limits\n\
             \n    Background:\n      Given a limit of 2\n\
             \n    @edge\n    Scenario: overflow\n      When I add 3 apples\n",
            "basket.feature",
        )
        .unwrap();
        assert_eq!(pickles.len(), 2);

        assert_eq!(pickles[0].name, "adding");
        assert_eq!(pickles[0].tag_names(), ["@shop", "@fast"]);
        assert_eq!(
            pickles[0].steps.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(),
            ["an empty basket", "I add an apple", "I have 1 item"],
        );
        assert_eq!(pickles[0].steps[1].ty, PickleStepType::Action);

        assert_eq!(pickles[1].name, "overflow");
        assert_eq!(pickles[1].tag_names(), ["@shop", "@slow", "@edge"]);
        assert_eq!(
            pickles[1].steps.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(),
            ["an empty basket", "a limit of 2", "I add 3 apples"],
        );
        assert_ne!(pickles[0].id, pickles[1].id);
    }

    #[test]
    fn expands_outline_examples() {
        let pickles = compiled(
            "Feature: Hungry\n\
             \n  Scenario Outline: eating <eat>\n\
             \x20   Given there are <start> cucumbers\n\
             \x20   Then I should have <left> cucumbers\n\
             \x20     | left   |\n\
             \x20     | <left> |\n\
             \n    @ex\n    Examples:\n\
             \x20     | start | eat | left |\n\
             \x20     |    12 |   5 |    7 |\n\
             \x20     |    20 |   4 |   16 |\n",
            "hungry.feature",
        )
        .unwrap();
        assert_eq!(pickles.len(), 2);

        assert_eq!(pickles[0].name, "eating 5");
        assert_eq!(pickles[1].name, "eating 4");
        assert_eq!(pickles[1].steps[0].text, "there are 20 cucumbers");
        assert_eq!(pickles[1].tag_names(), ["@ex"]);
        assert_eq!(
            pickles[1].steps[1].argument,
            Some(StepArgument::DataTable(DataTable::from(vec![
                vec!["left"],
                vec!["16"],
            ]))),
        );
        assert!(pickles[0].line < pickles[1].line);
    }

    #[test]
    fn example_lines_skip_blank_and_comment_rows() {
        let pickles = compiled(
            "Feature: Hungry\n\
             \n  Scenario Outline: eating <eat>\n\
             \x20   Given I eat <eat> cucumbers\n\
             \n    Examples:\n\
             \x20     | eat |\n\
             \n      # first\n\
             \x20     |   5 |\n\
             \n\
             \x20     |   4 |\n",
            "hungry.feature",
        )
        .unwrap();

        assert_eq!(
            pickles.iter().map(|p| p.line).collect::<Vec<_>>(),
            [10, 12],
        );
    }

    #[test]
    fn errors_on_unknown_placeholder() {
        let err = compiled(
            "Feature: Hungry\n\
             \n  Scenario Outline: eating\n\
             \x20   Given there are <unknown> cucumbers\n\
             \n    Examples:\n\
             \x20     | start |\n\
             \x20     |    12 |\n",
            "hungry.feature",
        )
        .unwrap_err();
        assert_eq!(err.name, "unknown");
        assert!(err.to_string().starts_with("Failed to resolve <unknown> at hungry.feature:"));
    }

    #[test]
    fn step_json_uses_camel_case_and_tolerates_unknown_types() {
        let step = PickleStep {
            text: "a doc".into(),
            ty: PickleStepType::Context,
            argument: Some(StepArgument::DocString(DocString {
                content: "hello".into(),
            })),
        };

        let json = step.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"text":"a doc","type":"Context","argument":{"docString":{"content":"hello"}}}"#,
        );
        assert_eq!(PickleStep::from_json(&json).unwrap(), step);

        let unknown =
            PickleStep::from_json(r#"{"text":"x","type":"Conjunction"}"#).unwrap();
        assert_eq!(unknown.ty, PickleStepType::Unknown);
        assert_eq!(unknown.argument, None);
    }

    #[test]
    fn tags_are_normalized_with_at_sign() {
        assert_eq!(Tag::new("wip").name, "@wip");
        assert_eq!(Tag::new("@wip").name, "@wip");
    }
}
