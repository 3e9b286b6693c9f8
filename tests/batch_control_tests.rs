mod common;

use common::{bootstrap_env, component};
use gatehouse::model::{Component, ComponentType, ControllerType};
use tokio_stream::StreamExt;

const PKG: &str = "com.example.app";

async fn collect(stream: tokio_stream::wrappers::ReceiverStream<Component>) -> Vec<Component> {
    stream.collect().await
}

#[tokio::test]
async fn batch_disable_tolerates_a_failing_item_and_reports_each() {
    let env = bootstrap_env("batch_partial", ControllerType::Pm).await;
    let repo = &env.engine.repository;

    let names = ["Alpha", "Beta", "Gamma"];
    let mut targets = Vec::new();
    for simple in names {
        let name = format!("{PKG}.{simple}");
        env.system.declare(PKG, ComponentType::Service, &name, false);
        targets.push(component(PKG, simple, ComponentType::Service, false, false));
    }
    repo.save_components(targets.clone()).await.unwrap();

    // The middle item refuses to toggle.
    env.remote.fail_for(&format!("{PKG}.Beta"));

    let events = collect(repo.batch_control_component(targets, false)).await;

    assert_eq!(events.len(), 3, "exactly one progress event per item");
    assert_eq!(
        events
            .iter()
            .map(|c| c.simple_name.as_str())
            .collect::<Vec<_>>(),
        vec!["Alpha", "Beta", "Gamma"],
        "events arrive in input order"
    );
    assert!(events[0].pm_blocked);
    assert!(!events[1].pm_blocked, "the failed item keeps its state");
    assert!(events[2].pm_blocked);

    // Cache rows mirror the emitted states.
    let alpha = repo
        .get_component(&format!("{PKG}.Alpha"))
        .await
        .unwrap()
        .unwrap();
    let beta = repo
        .get_component(&format!("{PKG}.Beta"))
        .await
        .unwrap()
        .unwrap();
    assert!(alpha.pm_blocked);
    assert!(!beta.pm_blocked);

    // All three items were attempted against the adapter.
    assert_eq!(env.remote.set_call_count(), 3);
    env.cleanup().await;
}

#[tokio::test]
async fn ifw_batch_enable_primes_pm_blocked_items_and_delegates_providers() {
    let env = bootstrap_env("batch_ifw", ControllerType::Ifw).await;
    let repo = &env.engine.repository;

    let blocked_activity = format!("{PKG}.Splash");
    env.system
        .declare(PKG, ComponentType::Activity, &blocked_activity, true);
    env.system.set_pm_disabled(PKG, &blocked_activity, true);
    env.overrides.block(PKG, &blocked_activity);

    let provider = format!("{PKG}.Files");
    env.system.declare(PKG, ComponentType::Provider, &provider, false);
    env.system.set_pm_disabled(PKG, &provider, true);

    let targets = vec![
        component(PKG, "Splash", ComponentType::Activity, true, true),
        component(PKG, "Files", ComponentType::Provider, true, false),
    ];
    repo.save_components(targets.clone()).await.unwrap();

    let events = collect(repo.batch_control_component(targets, true)).await;

    assert_eq!(
        events
            .iter()
            .map(|c| c.simple_name.as_str())
            .collect::<Vec<_>>(),
        vec!["Splash", "Files"]
    );
    assert!(!events[0].pm_blocked, "pm block lifted by the prime pass");
    assert!(!events[0].ifw_blocked, "ifw block lifted by the batch");
    assert!(!events[1].pm_blocked, "provider delegated to the pm path");
    assert!(!events[1].ifw_blocked);

    assert!(!env.overrides.contains(PKG, &blocked_activity));
    assert!(!env.system.is_pm_disabled(PKG, &blocked_activity));
    assert!(!env.system.is_pm_disabled(PKG, &provider));
    env.cleanup().await;
}

#[tokio::test]
async fn empty_batch_completes_with_no_events() {
    let env = bootstrap_env("batch_empty", ControllerType::Pm).await;
    let repo = &env.engine.repository;

    let events = collect(repo.batch_control_component(Vec::new(), false)).await;
    assert!(events.is_empty());
    assert_eq!(env.remote.set_call_count(), 0);
    env.cleanup().await;
}
