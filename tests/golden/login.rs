// Generated by cucumber-harness from "tests/features/login.feature". Do not edit.

#[allow(clippy::all, unused_imports)]
pub fn program() -> ::cucumber_harness::program::Program {
    use ::cucumber_harness::program::dsl::*;

    program("tests/features/login.feature", "", vec![
        before_all(apply_hooks(HookPhase::BeforeAll)),
        after_all(apply_hooks(HookPhase::AfterAll)),
        describe("Accounts", vec![
            describe("1. Login", vec![
                before_all(apply_tagged_hooks(HookPhase::Before, &[])),
                after_all(apply_tagged_hooks(HookPhase::After, &[])),
                before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),
                after_each(apply_tagged_hooks(HookPhase::AfterStep, &[])),
                it("a user", run_step("{\"text\":\"a user\",\"type\":\"Context\"}")),
            ]),
            describe("Logout", vec![
                before_all(apply_tagged_hooks(HookPhase::Before, &[])),
                after_all(apply_tagged_hooks(HookPhase::After, &[])),
                before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),
                after_each(apply_tagged_hooks(HookPhase::AfterStep, &[])),
                it("a user", run_step("{\"text\":\"a user\",\"type\":\"Context\"}")),
            ]),
            describe("2. Login", vec![
                before_all(apply_tagged_hooks(HookPhase::Before, &["@admin"])),
                after_all(apply_tagged_hooks(HookPhase::After, &["@admin"])),
                before_each(apply_tagged_hooks(HookPhase::BeforeStep, &["@admin"])),
                after_each(apply_tagged_hooks(HookPhase::AfterStep, &["@admin"])),
                it("an admin", run_step("{\"text\":\"an admin\",\"type\":\"Context\"}")),
            ]),
            describe("3. Login", vec![
                before_all(apply_tagged_hooks(HookPhase::Before, &[])),
                after_all(apply_tagged_hooks(HookPhase::After, &[])),
                before_each(apply_tagged_hooks(HookPhase::BeforeStep, &[])),
                after_each(apply_tagged_hooks(HookPhase::AfterStep, &[])),
                it("a guest", run_step("{\"text\":\"a guest\",\"type\":\"Context\"}")),
            ]),
        ]),
    ])
}
