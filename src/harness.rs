// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Harness`] turning a directory of `.feature` files into [`Program`]s.
//!
//! The [`Harness`] either writes the printed [`Program`]s into a directory
//! (for using from a `build.rs` script), or runs them right away in-process
//! against a [`Registry`].

use std::{
    env, fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use derive_more::with_trait::Debug;
use smart_default::SmartDefault;

use crate::{
    document::{self, Document},
    generate::{self, GenerateError, GenerateOptions},
    host::{Report, Runner, Session},
    pickle::Pickle,
    program::Program,
    registry::Registry,
    tag::TagExpression,
    Error,
};

/// Environment variable the tag filter is read from, unless it's configured
/// explicitly.
pub const TAG_FILTER_ENV: &str = "CUCUMBER_TAG_FILTER";

/// Configuration of a [`Harness`].
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Directory the globs are resolved against.
    #[default(PathBuf::from("."))]
    pub cwd: PathBuf,

    /// Tag expression selecting the scenarios to run.
    ///
    /// Falls back to the [`TAG_FILTER_ENV`] environment variable.
    pub tag_filter: Option<String>,

    /// Glob of the step definition files to import into every printed
    /// [`Program`].
    pub step_definitions: Option<String>,

    /// Glob of the `.feature` files.
    #[default("**/*.feature".to_owned())]
    pub features: String,
}

impl Config {
    /// Resolves the tag filter of this [`Config`], falling back to the
    /// [`TAG_FILTER_ENV`] environment variable. Blank filters are ignored.
    ///
    /// # Errors
    ///
    /// If the tag filter is malformed.
    pub fn tag_expression(&self) -> Result<Option<TagExpression>, Error> {
        self.tag_filter
            .clone()
            .or_else(|| env::var(TAG_FILTER_ENV).ok())
            .filter(|f| !f.trim().is_empty())
            .map(TagExpression::parse)
            .transpose()
            .map_err(Into::into)
    }
}

/// [`Program`] generated for a single [`Document`].
#[derive(Clone, Debug)]
pub struct Generated {
    /// Source [`Document`].
    pub document: Document,

    /// [`Pickle`]s of the [`Document`].
    pub pickles: Vec<Pickle>,

    /// Generated [`Program`].
    pub program: Program,

    /// Printed [`Program`].
    pub source: String,
}

/// Outcome of generating [`Program`]s for all the discovered documents.
#[derive(Debug, Default)]
pub struct Batch {
    /// Successfully generated [`Program`]s, in discovery order.
    pub generated: Vec<Generated>,

    /// Documents failed to generate, in discovery order.
    pub failures: Vec<GenerateError>,
}

impl Batch {
    /// Turns this [`Batch`] into its [`Generated`] [`Program`]s, failing on the
    /// first [`GenerateError`], if any.
    ///
    /// # Errors
    ///
    /// If any document failed to generate.
    pub fn into_result(self) -> Result<Vec<Generated>, Error> {
        match self.failures.into_iter().next() {
            Some(e) => Err(e.into()),
            None => Ok(self.generated),
        }
    }
}

/// Observer called for every successfully generated [`Program`].
pub type OnGenerate = Box<dyn Fn(&Document, &[Pickle], &str)>;

/// Discovers `.feature` files and lowers them into [`Program`]s.
#[derive(Debug, Default)]
pub struct Harness {
    config: Config,

    #[debug(skip)]
    on_generate: Option<OnGenerate>,
}

impl Harness {
    /// Creates a new [`Harness`] with the given [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, on_generate: None }
    }

    /// Sets the observer called with the [`Document`], its [`Pickle`]s and
    /// the printed [`Program`] once it's generated successfully.
    #[must_use]
    pub fn on_generate(
        mut self,
        f: impl Fn(&Document, &[Pickle], &str) + 'static,
    ) -> Self {
        self.on_generate = Some(Box::new(f));
        self
    }

    /// Returns the [`Config`] of this [`Harness`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the header of printed [`Program`]s, importing every discovered
    /// step definition file as a `step_definitions_N` module.
    ///
    /// # Errors
    ///
    /// If the glob is malformed, or a path cannot be made absolute.
    pub fn imports(&self) -> Result<String, Error> {
        let Some(glob) = &self.config.step_definitions else {
            return Ok(String::new());
        };

        document::discover(&self.config.cwd, glob)?
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let path = std::path::absolute(&path)
                    .map_err(|e| Error::io(&path, e))?;
                Ok(format!(
                    "#[path = {:?}]\nmod step_definitions_{i};",
                    document::uri_of(&path),
                ))
            })
            .collect::<Result<Vec<_>, Error>>()
            .map(|lines| lines.join("\n"))
    }

    /// Generates [`Program`]s for all the discovered `.feature` files.
    ///
    /// A document failing to generate doesn't stop the others, and is
    /// reported in [`Batch::failures`].
    ///
    /// # Errors
    ///
    /// If the [`Config`] is invalid.
    pub fn generate(&self) -> Result<Batch, Error> {
        let opts = GenerateOptions {
            imports: self.imports()?,
            tag_expression: self.config.tag_expression()?,
        };

        let mut batch = Batch::default();
        for path in document::discover(&self.config.cwd, &self.config.features)? {
            match self.generate_document(&path, &opts) {
                Ok(g) => batch.generated.push(g),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to generate program",
                    );
                    batch.failures.push(e);
                }
            }
        }
        Ok(batch)
    }

    /// Writes printed [`Program`]s into the `out_dir`, one file per document,
    /// along with a `programs.rs` file collecting all of them.
    ///
    /// Returns the paths of the written files.
    ///
    /// # Errors
    ///
    /// If any document fails to generate, or a file cannot be written.
    pub fn write_to(&self, out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
        let out_dir = out_dir.as_ref();
        let generated = self.generate()?.into_result()?;

        fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

        let mut written = Vec::with_capacity(generated.len() + 1);
        let mut modules = Vec::with_capacity(generated.len());
        for (i, g) in generated.iter().enumerate() {
            let module = module_name(&g.document.uri, i);
            let path = out_dir.join(format!("{module}.rs"));
            fs::write(&path, &g.source).map_err(|e| Error::io(&path, e))?;
            tracing::debug!(path = %path.display(), "written program");
            written.push(path);
            modules.push(module);
        }

        let index = out_dir.join("programs.rs");
        fs::write(&index, print_index(&modules))
            .map_err(|e| Error::io(&index, e))?;
        written.push(index);

        Ok(written)
    }

    /// Generates and runs [`Program`]s for all the discovered `.feature`
    /// files against the given [`Registry`], each document with a fresh
    /// [`Session`].
    ///
    /// # Errors
    ///
    /// If any document fails to generate.
    pub async fn run<S>(&self, registry: Rc<Registry<S>>) -> Result<Report, Error>
    where
        S: Clone + Default + 'static,
    {
        let mut report = Report::default();
        for g in self.generate()?.into_result()? {
            let mut runner = Runner::new(Session::new(Rc::clone(&registry)));
            report.merge(runner.run(&g.program).await);
        }
        Ok(report)
    }

    fn generate_document(
        &self,
        path: &Path,
        opts: &GenerateOptions,
    ) -> Result<Generated, GenerateError> {
        let uri = document::uri_of(path.strip_prefix(&self.config.cwd).unwrap_or(path));
        let fail = |kind| GenerateError { path: uri.clone(), kind };

        let mut document = Document::parse_path(path).map_err(|e| fail(e.into()))?;
        document.uri.clone_from(&uri);
        let pickles = document.pickles().map_err(|e| fail(e.into()))?;

        let program = generate::generate(&document, &pickles, opts)?;
        let source = program.print();
        if let Some(f) = &self.on_generate {
            f(&document, &pickles, &source);
        }

        Ok(Generated { document, pickles, program, source })
    }
}

/// Makes a module name out of the given document `uri`.
fn module_name(uri: &str, index: usize) -> String {
    let stem = uri.strip_suffix(".feature").unwrap_or(uri);
    let name = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect::<String>();
    format!("feature_{index}_{}", name.trim_matches('_'))
}

/// Prints the module collecting all the written [`Program`]s.
fn print_index(modules: &[String]) -> String {
    let mut out = String::from("// Generated by cucumber-harness. Do not edit.\n\n");
    for m in modules {
        out.push_str(&format!("#[path = \"{m}.rs\"]\nmod {m};\n"));
    }
    out.push_str(
        "\n/// Returns all the generated programs, in discovery order.\n\
         pub fn programs() -> Vec<::cucumber_harness::program::Program> {\n    vec![",
    );
    let calls = modules.iter().map(|m| format!("{m}::program()")).collect::<Vec<_>>();
    out.push_str(&calls.join(", "));
    out.push_str("]\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use futures::executor::block_on;

    use super::*;
    use crate::generate::GenerateErrorKind;

    fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn config(dir: &Path) -> Config {
        Config {
            cwd: dir.to_owned(),
            tag_filter: Some("not @wip".into()),
            ..Config::default()
        }
    }

    const COUNTER: &str = "\
Feature: Counter
  Scenario: up
    Given the counter is 0
    When I increase the counter by 2
    Then the counter should be 2
";

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.cwd, PathBuf::from("."));
        assert_eq!(config.features, "**/*.feature");
        assert!(config.step_definitions.is_none());
    }

    #[test]
    fn explicit_tag_filter_wins() {
        let config = Config { tag_filter: Some("@fast".into()), ..Config::default() };

        assert_eq!(config.tag_expression().unwrap().unwrap().as_str(), "@fast");
    }

    #[test]
    fn malformed_tag_filter_is_an_error() {
        let config = Config { tag_filter: Some("@a and".into()), ..Config::default() };

        assert!(matches!(config.tag_expression(), Err(Error::TagFilter(_))));
    }

    #[test]
    fn imports_step_definitions() {
        let dir = workspace(&[
            ("steps/counter.rs", "// steps"),
            ("steps/login.rs", "// steps"),
        ]);
        let harness = Harness::new(Config {
            step_definitions: Some("steps/*.rs".into()),
            ..config(dir.path())
        });

        let imports = harness.imports().unwrap();
        let lines = imports.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("#[path = \"") && lines[0].ends_with("counter.rs\"]"));
        assert_eq!(lines[1], "mod step_definitions_0;");
        assert!(lines[2].ends_with("login.rs\"]"));
        assert_eq!(lines[3], "mod step_definitions_1;");
    }

    #[test]
    fn reports_failing_documents_and_continues() {
        let dir = workspace(&[
            ("a/broken.feature", "Scenario without feature\n"),
            ("b/counter.feature", COUNTER),
        ]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let harness = Harness::new(config(dir.path())).on_generate({
            let seen = Rc::clone(&seen);
            move |doc, pickles, src| {
                assert!(src.contains("pub fn program()"));
                seen.borrow_mut().push((doc.uri.clone(), pickles.len()));
            }
        });

        let batch = harness.generate().unwrap();

        assert_eq!(batch.generated.len(), 1);
        assert_eq!(*seen.borrow(), [("b/counter.feature".to_owned(), 1)]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].path, "a/broken.feature");
        assert!(matches!(batch.failures[0].kind, GenerateErrorKind::Load(_)));
        assert!(batch.into_result().is_err());
    }

    #[test]
    fn writes_programs_with_index() {
        let dir = workspace(&[("features/counter.feature", COUNTER)]);
        let out = tempfile::tempdir().unwrap();

        let written = Harness::new(config(dir.path())).write_to(out.path()).unwrap();

        let names = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, ["feature_0_features_counter.rs", "programs.rs"]);

        let index = fs::read_to_string(&written[1]).unwrap();
        assert!(index.contains("mod feature_0_features_counter;"));
        assert!(index.contains("vec![feature_0_features_counter::program()]"));
    }

    #[test]
    fn runs_programs_in_process() {
        let dir = workspace(&[
            ("counter.feature", COUNTER),
            ("wip.feature", "@wip\nFeature: Wip\n  Scenario: todo\n    Given nothing\n"),
        ]);
        let mut registry = Registry::<i64>::new();
        _ = registry
            .given("the counter is {int}", |_, p, _| async move { p.int(0) })
            .unwrap()
            .when("I increase the counter by {int}", |n, p, _| async move {
                Ok::<_, crate::parameter::ParameterError>(n + p.int(0)?)
            })
            .unwrap()
            .then("the counter should be {int}", |n, p, _| async move {
                anyhow::ensure!(n == p.int(0)?, "counter is {n}");
                Ok(n)
            })
            .unwrap();

        let report =
            block_on(Harness::new(config(dir.path())).run(registry.freeze())).unwrap();

        assert_eq!((report.passed(), report.skipped()), (3, 1), "{report}");
        assert!(report.is_success());
        assert!(
            report.get("Counter > up > the counter should be 2").is_some(),
        );
    }
}
