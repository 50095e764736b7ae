//! End-to-end runs of the research workflow against deterministic fakes.

mod common;

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use common::{coordinator, messages, plan_json, position, run_to_end, FakeGenerator, Outbox};
use deep_research::{ProgressEvent, ResearchError, ResearchStage};

const BATTERY_QUERY: &str = "Latest advances in battery tech 2025";

fn final_report(events: &[Result<ProgressEvent, ResearchError>]) -> &deep_research::Report {
    match events.last() {
        Some(Ok(ProgressEvent::FinalReport(report))) => report,
        other => panic!("run did not end with a report: {:?}", other),
    }
}

#[tokio::test]
async fn test_battery_query_without_email() {
    let generator = Arc::new(FakeGenerator::new(plan_json("null")));
    let outbox = Arc::new(Outbox::default());

    let events = run_to_end(coordinator(generator.clone(), Some(outbox.clone())), BATTERY_QUERY).await;

    let report = final_report(&events);
    assert!(report.markdown_report.starts_with("# Battery Tech 2025"));
    assert_eq!(generator.search_terms.lock().unwrap().len(), 5);
    assert!(outbox.sent.lock().unwrap().is_empty());

    let messages = messages(&events);
    assert_eq!(
        messages.last().map(String::as_str),
        Some("Skipping email send, as not required...")
    );
    assert!(!messages.iter().any(|m| m.contains("sending email")));
}

#[tokio::test]
async fn test_email_recipient_notified_once() {
    let generator = Arc::new(FakeGenerator::new(plan_json(r#""alice@example.com""#)));
    let outbox = Arc::new(Outbox::default());

    let events = run_to_end(
        coordinator(generator, Some(outbox.clone())),
        "Latest advances in battery tech 2025, send to alice@example.com",
    )
    .await;

    final_report(&events);
    assert_eq!(outbox.recipients(), vec!["alice@example.com".to_string()]);
    assert!(outbox.sent.lock().unwrap()[0].html_body.contains("<h1>Battery Tech 2025</h1>"));

    let messages = messages(&events);
    assert!(messages.contains(&"Report written, sending email...".to_string()));
    assert!(messages.contains(&"Email sent, research complete".to_string()));
}

#[tokio::test]
async fn test_all_searches_fail_still_writes_report() {
    let generator = Arc::new(FakeGenerator::new(plan_json("null")).failing_searches(&["*"]));

    let events = run_to_end(coordinator(generator.clone(), None), BATTERY_QUERY).await;

    final_report(&events);
    assert_eq!(generator.writer_calls(), 1);
    let writer_input = generator.writer_inputs.lock().unwrap()[0].clone();
    assert!(writer_input.contains("none (every search failed)"));

    let messages = messages(&events);
    assert!(messages.contains(&"Searching... 5/5 completed".to_string()));
    assert!(messages.contains(&"Searches complete, writing report...".to_string()));
}

#[tokio::test]
async fn test_partial_failures_shrink_results() {
    let generator = Arc::new(
        FakeGenerator::new(plan_json("null")).failing_searches(&["sodium", "recycling"]),
    );

    let events = run_to_end(coordinator(generator.clone(), None), BATTERY_QUERY).await;

    final_report(&events);
    let writer_input = generator.writer_inputs.lock().unwrap()[0].clone();
    assert!(writer_input.contains("### Result 3"));
    assert!(!writer_input.contains("### Result 4"));
    assert!(!writer_input.contains("sodium"));
}

#[tokio::test]
async fn test_final_progress_count_equals_plan_size() {
    let generator = Arc::new(
        FakeGenerator::new(plan_json("null"))
            .with_delay("solid state", 60)
            .with_delay("grid", 30)
            .failing_searches(&["lithium"]),
    );

    let events = run_to_end(coordinator(generator, None), BATTERY_QUERY).await;

    let searching: Vec<_> = messages(&events)
        .into_iter()
        .filter(|m| m.starts_with("Searching... "))
        .collect();
    assert_eq!(searching.len(), 5);
    assert_eq!(searching.last().unwrap(), "Searching... 5/5 completed");
}

#[tokio::test]
async fn test_notifier_failure_is_not_fatal() {
    let generator = Arc::new(FakeGenerator::new(plan_json(r#""alice@example.com""#)));
    let outbox = Arc::new(Outbox::failing());

    let events = run_to_end(
        coordinator(generator, Some(outbox.clone())),
        "battery tech, send to alice@example.com",
    )
    .await;

    assert!(events.iter().all(|e| e.is_ok()));
    final_report(&events);
    assert_eq!(outbox.sent.lock().unwrap().len(), 1);

    let messages = messages(&events);
    assert!(messages
        .last()
        .unwrap()
        .starts_with("Could not send email: email provider returned HTTP 503"));
}

#[tokio::test]
async fn test_event_order_invariant() {
    for email in ["null", r#""alice@example.com""#] {
        let generator = Arc::new(FakeGenerator::new(plan_json(email)));
        let outbox = Arc::new(Outbox::default());

        let events = run_to_end(
            coordinator(generator, Some(outbox)),
            "battery tech, send to alice@example.com",
        )
        .await;
        let messages = messages(&events);

        let planned = position(&messages, "Searches planned");
        let searches_done = position(&messages, "Searches complete");
        let written = position(&messages, "Report written");
        let emailed = messages
            .iter()
            .position(|m| m.starts_with("Email sent") || m.starts_with("Skipping email send"))
            .unwrap();

        assert!(planned < searches_done);
        assert!(searches_done < written);
        assert!(written < emailed);
        assert!(events.last().unwrap().as_ref().unwrap().is_final());
    }
}

#[tokio::test]
async fn test_stages_never_go_backwards() {
    let generator = Arc::new(FakeGenerator::new(plan_json(r#""alice@example.com""#)));
    let outbox = Arc::new(Outbox::default());

    let events = run_to_end(coordinator(generator, Some(outbox)), "topic for alice@example.com").await;

    let stages: Vec<ResearchStage> = events
        .iter()
        .filter_map(|e| match e {
            Ok(ProgressEvent::Status { stage, .. }) => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages.first(), Some(&ResearchStage::Planning));
    assert_eq!(stages.last(), Some(&ResearchStage::Done));
    assert!(stages.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_planning_failure_ends_run() {
    let generator = Arc::new(FakeGenerator::new(String::new()).failing_plan("model offline"));

    let events = run_to_end(coordinator(generator.clone(), None), BATTERY_QUERY).await;

    assert_eq!(events.len(), 2);
    assert!(events[0].is_ok());
    match &events[1] {
        Err(ResearchError::Planning(msg)) => assert!(msg.contains("model offline")),
        other => panic!("expected planning error, got {:?}", other),
    }
    assert!(generator.search_terms.lock().unwrap().is_empty());
    assert_eq!(generator.writer_calls(), 0);
}

#[tokio::test]
async fn test_writing_failure_ends_run() {
    let generator = Arc::new(FakeGenerator::new(plan_json(r#""alice@example.com""#)).failing_report("context too long"));
    let outbox = Arc::new(Outbox::default());

    let events = run_to_end(
        coordinator(generator, Some(outbox.clone())),
        "battery tech, send to alice@example.com",
    )
    .await;

    assert!(matches!(events.last(), Some(Err(ResearchError::Writing(_)))));
    assert_eq!(events.iter().filter(|e| e.is_err()).count(), 1);
    assert!(!events.iter().any(|e| matches!(e, Ok(ProgressEvent::FinalReport(_)))));
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_query_rejected_before_planning() {
    let generator = Arc::new(FakeGenerator::new(plan_json("null")));

    let events = run_to_end(coordinator(generator.clone(), None), " \t ").await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Err(ResearchError::EmptyQuery)));
    assert_eq!(generator.writer_calls(), 0);
}

#[tokio::test]
async fn test_fabricated_recipient_is_ignored() {
    let generator = Arc::new(FakeGenerator::new(plan_json(r#""mallory@example.com""#)));
    let outbox = Arc::new(Outbox::default());

    let events = run_to_end(coordinator(generator, Some(outbox.clone())), BATTERY_QUERY).await;

    final_report(&events);
    assert!(outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dropping_stream_cancels_in_flight_searches() {
    let generator = Arc::new(
        FakeGenerator::new(plan_json("null"))
            .with_delay("solid state", 10)
            .with_delay("sodium", 400)
            .with_delay("recycling", 400)
            .with_delay("lithium", 400)
            .with_delay("grid", 400),
    );

    {
        let events = coordinator(generator.clone(), None).run(BATTERY_QUERY);
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            let event = event.unwrap();
            if event.message() == Some("Searching... 1/5 completed") {
                break;
            }
        }
    }

    assert_eq!(generator.search_terms.lock().unwrap().len(), 5);
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(generator.settled(), 1);
    assert_eq!(generator.writer_calls(), 0);
}
