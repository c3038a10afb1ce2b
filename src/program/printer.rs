// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Printing of [`Program`]s into Rust source.
//!
//! The printed source declares the [`Program`] via the [`dsl`], so it can be
//! `include!`d into a module:
//! ```rust,ignore
//! mod counter {
//!     include!(concat!(env!("OUT_DIR"), "/counter.rs"));
//! }
//!
//! let program = counter::program();
//! ```
//!
//! [`dsl`]: super::dsl

use std::fmt::Write as _;

use itertools::Itertools as _;

use super::{Call, Node, Program};

/// Indentation unit of the printed source.
const INDENT: &str = "    ";

/// Prints the given [`Program`] into Rust source defining a
/// `pub fn program()` returning it.
#[must_use]
pub fn print(program: &Program) -> String {
    let mut out = String::new();

    _ = writeln!(
        out,
        "// Generated by cucumber-harness from {:?}. Do not edit.\n",
        program.source,
    );
    if !program.imports.is_empty() {
        out.push_str(&program.imports);
        if !program.imports.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str(
        "#[allow(clippy::all, unused_imports)]\n\
         pub fn program() -> ::cucumber_harness::program::Program {\n\
         \x20   use ::cucumber_harness::program::dsl::*;\n\n",
    );
    _ = writeln!(
        out,
        "{INDENT}program({:?}, {:?}, vec![",
        program.source, program.imports,
    );
    print_nodes(&mut out, &program.nodes, 2);
    _ = writeln!(out, "{INDENT}])\n}}");

    out
}

fn print_nodes(out: &mut String, nodes: &[Node], depth: usize) {
    let indent = INDENT.repeat(depth);
    for node in nodes {
        match node {
            Node::Lifecycle(h) => {
                _ = writeln!(
                    out,
                    "{indent}{}({}),",
                    h.kind.dsl_name(),
                    print_call(&h.call),
                );
            }
            Node::Suite(s) => {
                let func = if s.skip { "describe_skip" } else { "describe" };
                _ = writeln!(out, "{indent}{func}({:?}, vec![", s.name);
                print_nodes(out, &s.nodes, depth + 1);
                _ = writeln!(out, "{indent}]),");
            }
            Node::Test(t) => {
                _ = writeln!(
                    out,
                    "{indent}it({:?}, {}),",
                    t.name,
                    print_call(&t.call),
                );
            }
        }
    }
}

fn print_call(call: &Call) -> String {
    match call {
        Call::ApplyHooks { phase, tags: None } => {
            format!("apply_hooks(HookPhase::{})", phase.variant())
        }
        Call::ApplyHooks { phase, tags: Some(tags) } => format!(
            "apply_tagged_hooks(HookPhase::{}, &[{}])",
            phase.variant(),
            tags.iter().map(|t| format!("{t:?}")).join(", "),
        ),
        Call::RunStep { step } => format!("run_step({step:?})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::dsl::*;

    fn sample() -> Program {
        program(
            "features/counter.feature",
            "#[path = \"steps/counter.rs\"]\nmod step_definitions_0;",
            vec![
                before_all(apply_hooks(HookPhase::BeforeAll)),
                describe_skip(
                    "2. Count \"up\"",
                    vec![
                        before_all(apply_tagged_hooks(HookPhase::Before, &["@a", "@b"])),
                        before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),
                        it("Given x", run_step(r#"{"text":"x","type":"Context"}"#)),
                    ],
                ),
                after_all(apply_hooks(HookPhase::AfterAll)),
            ],
        )
    }

    #[test]
    fn prints_header_and_imports() {
        let src = print(&sample());

        assert!(src.starts_with(
            "// Generated by cucumber-harness from \"features/counter.feature\". \
             Do not edit.\n\n#[path = \"steps/counter.rs\"]\nmod step_definitions_0;\n\n",
        ));
        assert!(src.contains("pub fn program() -> ::cucumber_harness::program::Program {"));
        assert!(src.trim_end().ends_with("])\n}"));
    }

    #[test]
    fn escapes_names_and_step_json() {
        let src = print(&sample());

        assert!(src.contains(r#"describe_skip("2. Count \"up\"", vec!["#), "{src}");
        assert!(
            src.contains(r#"it("Given x", run_step("{\"text\":\"x\",\"type\":\"Context\"}")),"#),
            "{src}",
        );
    }

    #[test]
    fn prints_hook_calls() {
        let src = print(&sample());

        assert!(src.contains("        before_all(apply_hooks(HookPhase::BeforeAll)),\n"));
        assert!(src.contains(
            "            before_all(apply_tagged_hooks(HookPhase::Before, &[\"@a\", \"@b\"])),\n",
        ));
        assert!(src.contains(
            "            before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),\n",
        ));
        assert!(src.contains("        after_all(apply_hooks(HookPhase::AfterAll)),\n"));
    }
}
