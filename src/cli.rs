// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `cucumber-harness` binary.

use std::{io::Write as _, path::PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::{
    harness::{Config, Harness, TAG_FILTER_ENV},
    Error,
};

/// Root CLI of the `cucumber-harness` binary.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "cucumber-harness",
    about = "Lowers Gherkin features into executable test programs."
)]
pub struct Opts {
    /// Command to perform.
    #[command(subcommand)]
    pub command: Command,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }

    /// Performs the [`Command`] of these [`Opts`].
    ///
    /// # Errors
    ///
    /// If the [`Command`] fails.
    pub fn run(self) -> Result<(), Error> {
        match self.command {
            Command::Generate(cli) => cli.run(),
        }
    }
}

/// Commands of the `cucumber-harness` binary.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Generates test programs out of `.feature` files.
    Generate(Generate),
}

/// CLI options of the `generate` command.
#[derive(Clone, Debug, Args)]
pub struct Generate {
    /// Glob of the `.feature` files.
    #[arg(long, value_name = "glob", default_value = "**/*.feature")]
    pub features: String,

    /// Glob of the step definition files to import into generated programs.
    #[arg(id = "steps", long = "steps", value_name = "glob")]
    pub step_definitions: Option<String>,

    /// Tag expression to filter scenarios by. Filtered out scenarios are
    /// generated skipped.
    #[arg(
        id = "tags",
        long = "tags",
        short = 't',
        value_name = "tagexpr",
        env = TAG_FILTER_ENV
    )]
    pub tag_filter: Option<String>,

    /// Directory the globs are resolved against.
    #[arg(long, value_name = "dir", default_value = ".")]
    pub cwd: PathBuf,

    /// Directory to write generated programs into. Prints them to STDOUT if
    /// omitted.
    #[arg(long, value_name = "dir")]
    pub out_dir: Option<PathBuf>,
}

impl From<Generate> for Config {
    fn from(cli: Generate) -> Self {
        Self {
            cwd: cli.cwd,
            tag_filter: cli.tag_filter,
            step_definitions: cli.step_definitions,
            features: cli.features,
        }
    }
}

impl Generate {
    fn run(self) -> Result<(), Error> {
        let out_dir = self.out_dir.clone();
        let harness = Harness::new(self.into());

        if let Some(dir) = out_dir {
            for path in harness.write_to(&dir)? {
                tracing::info!(path = %path.display(), "generated");
            }
            return Ok(());
        }

        let mut stdout = std::io::stdout().lock();
        for g in harness.generate()?.into_result()? {
            writeln!(stdout, "{}", g.source)
                .map_err(|e| Error::io(&g.document.uri, e))?;
        }
        Ok(())
    }
}
