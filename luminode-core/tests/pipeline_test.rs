use std::time::Duration;

use luminode_core::models::{ControlMode, ControlState, FaultCode, SwitchState};
use luminode_core::publisher::MemorySink;
use luminode_core::signature::RenderDecision;
use luminode_core::view::{DashboardSummary, NodeFilter, Page};
use luminode_core::{CommandPublisher, ControlCenter, Pipeline, RenderScheduler, ingress_queue};
use time::macros::datetime;

#[tokio::test(start_paused = true)]
async fn test_ingest_to_render() {
    let (tx, mut rx) = ingress_queue();
    let mut pipeline = Pipeline::new();
    let scheduler = RenderScheduler::new();

    let producer = std::thread::spawn(move || {
        tx.ingest(br#"{"node_id":"N1","status":"ON","power":0.1,"timestamp":"2024-01-01 00:00:00"}"#);
        tx.ingest(b"garbage from a flaky radio");
    });
    producer.join().unwrap();

    let decision = scheduler.run_cycle(&mut pipeline, &mut rx, Page::Dashboard).await;
    assert_eq!(
        decision,
        RenderDecision::Render { history_changed: true, signature_changed: true, page_changed: true }
    );

    let store = pipeline.store();
    let latest = &store.latest()["N1"];
    assert_eq!(latest.fault_code, FaultCode::LampFailure);
    assert_eq!(latest.timestamp, datetime!(2024-01-01 00:00:00 UTC));
    assert_eq!(store.history().len(), 1);
    assert_eq!(store.control("N1"), Some(&ControlState::default()));

    let summary = DashboardSummary::build(store, &NodeFilter::All);
    assert_eq!(summary.faults, 1);
    assert_eq!(summary.healthy, 0);

    assert!(rx.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_message_only_moves_history() {
    let (tx, mut rx) = ingress_queue();
    let mut pipeline = Pipeline::new();
    let scheduler = RenderScheduler::new().settle_delay(Duration::from_millis(10));
    let payload = br#"{"node_id":"N1","status":"OFF","timestamp":"2024-01-01 00:00:00"}"#;

    tx.ingest(payload);
    assert!(scheduler.run_cycle(&mut pipeline, &mut rx, Page::Dashboard).await.should_render());

    tx.ingest(payload);
    assert_eq!(
        scheduler.run_cycle(&mut pipeline, &mut rx, Page::Dashboard).await,
        RenderDecision::Render { history_changed: true, signature_changed: false, page_changed: false }
    );

    assert_eq!(scheduler.run_cycle(&mut pipeline, &mut rx, Page::Dashboard).await, RenderDecision::Idle);
}

#[test]
fn test_operator_switches_node_on() {
    let (tx, mut rx) = ingress_queue();
    let mut pipeline = Pipeline::new();
    let sink = MemorySink::new();
    let center = ControlCenter::new(CommandPublisher::new(&sink, "luminode/v4/control"));

    tx.ingest(br#"{"node_id":"N1","status":"OFF"}"#);
    RenderScheduler::new().drain(&mut pipeline, &mut rx);

    center.set_mode(pipeline.store_mut(), "N1", ControlMode::Manual);
    center.switch(pipeline.store_mut(), "N1", SwitchState::On);

    let payloads = sink.payloads();
    assert_eq!(payloads.last().unwrap(), r#"{"node_id":"N1","command":"ON","mode":"MANUAL"}"#);
    assert_eq!(pipeline.store().control("N1").unwrap().mode, ControlMode::Manual);
}
