// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::rc::Rc;

use cucumber_harness::{
    data_table, generate, Document, GenerateOptions, Hook, Program, Registry,
    Runner, Session, Status, StepError, TagExpression,
};

#[derive(Clone, Debug, Default)]
struct World {
    counter: i64,
    stack: Vec<String>,
    log: Vec<String>,
}

fn log(entry: &'static str) -> Hook<World> {
    Hook::new(move |mut w: World| async move {
        w.log.push(entry.to_owned());
        anyhow::Ok(w)
    })
}

fn registry() -> Rc<Registry<World>> {
    let mut registry = Registry::new();
    _ = registry
        .given("the counter is {int}", |mut w: World, p, _| async move {
            w.counter = p.int(0)?;
            anyhow::Ok(w)
        })
        .unwrap()
        .when("I increase the counter by {int}", |mut w: World, p, _| async move {
            w.counter += p.int(0)?;
            anyhow::Ok(w)
        })
        .unwrap()
        .then("the counter should be {int}", |w: World, p, _| async move {
            let expected = p.int(0)?;
            anyhow::ensure!(w.counter == expected, "counter is {}", w.counter);
            Ok(w)
        })
        .unwrap()
        .when("I push {string}", |mut w: World, p, _| async move {
            w.stack.push(p.string(0)?.to_owned());
            anyhow::Ok(w)
        })
        .unwrap()
        .then("the stack is", |w: World, _, arg| async move {
            let items = data_table::records(arg.as_ref())?
                .into_iter()
                .map(|r| r["item"].clone())
                .collect::<Vec<_>>();
            anyhow::ensure!(w.stack == items, "stack is {:?}", w.stack);
            Ok(w)
        })
        .unwrap()
        .before_all(log("before all"))
        .unwrap()
        .before(log("before slow").tags("@slow"))
        .unwrap()
        .after(log("after"))
        .unwrap()
        .after_all(log("after all"))
        .unwrap();
    registry.freeze()
}

fn program(path: &str, opts: &GenerateOptions) -> Program {
    let doc = Document::parse_path(path).unwrap();
    let pickles = doc.pickles().unwrap();
    generate(&doc, &pickles, opts).unwrap()
}

#[tokio::test]
async fn runs_counter_feature() {
    let program = program("tests/features/counter.feature", &GenerateOptions::default());
    let mut runner = Runner::new(Session::new(registry()));

    let report = runner.run(&program).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), 13);
    assert!(report
        .get("Counter > increasing by 3 > I increase the counter by 3")
        .is_some());

    let world = runner.into_session().into_state();
    assert_eq!(world.stack, ["x", "y"]);
    assert_eq!(
        world.log,
        [
            "before all",
            "after",
            "before slow",
            "after",
            "before slow",
            "after",
            "after",
            "after all",
        ],
    );
}

#[tokio::test]
async fn skips_filtered_scenarios() {
    let opts = GenerateOptions {
        tag_expression: Some(TagExpression::parse("@counter and not @slow").unwrap()),
        ..GenerateOptions::default()
    };
    let program = program("tests/features/counter.feature", &opts);
    let mut runner = Runner::new(Session::new(registry()));

    let report = runner.run(&program).await;

    assert!(report.is_success(), "{report}");
    assert_eq!((report.passed(), report.skipped()), (7, 6));
    assert!(!runner.session().state().log.iter().any(|e| e == "before slow"));
}

#[tokio::test]
async fn failures_are_isolated_to_their_tests() {
    let doc = Document::parse_str(
        "inline.feature",
        "\
Feature: Broken
  Scenario: missing step
    Given the counter is 1
    When I jump
    Then the counter should be 1

  Scenario: wrong value
    Given the counter is 2
    Then the counter should be 3
",
    )
    .unwrap();
    let pickles = doc.pickles().unwrap();
    let program = generate(&doc, &pickles, &GenerateOptions::default()).unwrap();
    let mut runner = Runner::new(Session::new(registry()));

    let report = runner.run(&program).await;

    assert_eq!((report.passed(), report.failed()), (3, 2), "{report}");
    let missing = report.get("Broken > missing step > I jump").unwrap();
    let Status::Failed(err) = &missing.status else {
        panic!("expected failure");
    };
    assert!(matches!(
        err.downcast_ref::<StepError>(),
        Some(StepError::NotFound { text, .. }) if text == "I jump",
    ));
    assert_eq!(
        report
            .get("Broken > wrong value > the counter should be 3")
            .and_then(|t| t.status.error())
            .map(ToString::to_string)
            .as_deref(),
        Some("counter is 2"),
    );
    // Both scenarios still run their `After` hooks.
    assert_eq!(
        runner.session().state().log,
        ["before all", "after", "after", "after all"],
    );
}
