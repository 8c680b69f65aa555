// tests/properties.rs

use std::path::Path;

use proptest::prelude::*;

use deployrun::engine::{sanitize_description, StepExecutor};
use deployrun::exec::Interrupt;
use deployrun::ledger::{MemoryLedgerStore, StateManager, StepStatus};
use deployrun::plan::render;
use deployrun::types::VarMap;
use deployrun_test_utils::builders::{ContextBuilder, PlanBuilder, StepBuilder};
use deployrun_test_utils::fake_backend::FakeBackend;

/// Outcome the fake backend should produce for one generated step.
#[derive(Debug, Clone, Copy)]
enum Fate {
    Pass,
    FailHalt,
    FailContinue,
}

fn fate() -> impl Strategy<Value = Fate> {
    prop_oneof![
        3 => Just(Fate::Pass),
        1 => Just(Fate::FailHalt),
        1 => Just(Fate::FailContinue),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn text_without_braces_renders_unchanged(text in "[^{}]*", env in "[a-z]{1,8}") {
        let mut vars = VarMap::new();
        vars.insert("key".to_string(), serde_yaml::Value::from("value"));
        let out = render(&text, &env, "plan", "type", &vars);
        prop_assert_eq!(out, text);
    }

    #[test]
    fn sanitized_descriptions_are_safe_file_names(description in ".{0,40}") {
        let name = sanitize_description(&description);
        prop_assert!(!name.contains(' '));
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('('));
        prop_assert!(!name.contains(')'));
    }

    #[test]
    fn run_stops_exactly_at_the_first_untolerated_failure(
        fates in proptest::collection::vec(fate(), 1..12)
    ) {
        let ctx = ContextBuilder::new(Path::new("/ws")).build();

        let mut plan = PlanBuilder::new();
        let mut backend = FakeBackend::new();
        for (idx, fate) in fates.iter().enumerate() {
            let marker = format!("step-{idx}-marker");
            let mut step = StepBuilder::command(&idx.to_string(), &format!("echo {marker}"));
            match fate {
                Fate::Pass => {}
                Fate::FailHalt => backend = backend.fail_when_contains(&marker, 1),
                Fate::FailContinue => {
                    backend = backend.fail_when_contains(&marker, 1);
                    step = step.continue_on_failure();
                }
            }
            plan = plan.step(step);
        }
        let plan = plan.build();

        let store = MemoryLedgerStore::new();
        let state = StateManager::load(Box::new(store.clone()));
        let mut executor = StepExecutor::new(&ctx, state, backend.clone(), Interrupt::never());
        let outcome = runtime().block_on(executor.run(&plan, false)).unwrap();

        let halt_at = fates.iter().position(|f| matches!(f, Fate::FailHalt));
        let expected_calls = halt_at.map_or(fates.len(), |idx| idx + 1);

        prop_assert_eq!(backend.call_count(), expected_calls);
        prop_assert_eq!(outcome.is_success(), halt_at.is_none());

        let ledger = store.snapshot().unwrap();
        prop_assert_eq!(ledger.steps.len(), expected_calls);
        for (idx, fate) in fates.iter().take(expected_calls).enumerate() {
            let expected = match fate {
                Fate::Pass => StepStatus::Ok,
                Fate::FailHalt | Fate::FailContinue => StepStatus::Failed,
            };
            prop_assert_eq!(ledger.status(&idx.to_string()), Some(expected));
        }
    }
}
