//! Property test: admission control never dispatches past the ceiling.

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use blueprint::domain::models::conversation::{ConversationHistory, MessageEntry};
use blueprint::services::Supervisor;

use common::{
    analyze_call, complete_call, stub_registry, test_config, turn_with_calls, Role, StubModel,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// However many analysis actions the plan requests, real dispatches
    /// stay at or under the ceiling and every request gets exactly one
    /// result.
    #[test]
    fn dispatches_bounded_by_ceiling(requested in 0usize..25, ceiling in 1usize..=6) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let calls = (0..requested)
                .map(|index| analyze_call(&format!("call-{index}"), &format!("topic {index}")))
                .collect();
            let model = Arc::new(StubModel::new().script(
                Role::Plan,
                vec![
                    Ok(turn_with_calls(calls)),
                    Ok(turn_with_calls(vec![complete_call("done")])),
                ],
            ));

            let mut config = test_config();
            config.max_concurrent_analysis_units = ceiling;
            let supervisor = Supervisor::new(
                Arc::new(config),
                model.clone(),
                Arc::new(stub_registry()),
            );

            let seed = ConversationHistory::from_entries(vec![MessageEntry::Human(
                "Repository: https://github.com/acme/widgets".to_string(),
            )]);
            let outcome = supervisor.run(seed).await;

            let dispatched = model.call_count(Role::Think);
            prop_assert!(dispatched <= ceiling);
            prop_assert_eq!(dispatched, requested.min(ceiling));
            // One result per requested action, never silently dropped.
            prop_assert_eq!(outcome.notes.len(), requested);
            Ok(())
        })?;
    }
}
