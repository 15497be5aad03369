mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{day, FakeGateway, Step};
use shared_utils::test_utils::{test_client, MockBackendResponses, TestUser};
use slot_booking_cell::models::{ExitNavigation, Selection};
use slot_booking_cell::services::booking::{BookingOutcome, BookingTransaction, FailureKind};
use slot_booking_cell::services::gateway::{BackendSlotGateway, SlotGateway};
use slot_booking_cell::SlotBookingError;

fn selection(time: &str) -> Selection {
    Selection {
        date: "2024-03-16".to_string(),
        time: time.to_string(),
    }
}

#[tokio::test]
async fn test_full_success_books_and_links() {
    let gateway = Arc::new(FakeGateway::new(Vec::new()));
    let booking = BookingTransaction::new(gateway.clone());

    let outcome = booking.book_slot(&selection("10:00"), "p-7", "d-3").await.unwrap();

    assert_eq!(outcome, BookingOutcome::Booked);
    assert!(outcome.result().is_full_success());
    assert_eq!(outcome.user_message(), "Appointment booked successfully!");
    assert_eq!(
        gateway.stamped.lock().unwrap().clone(),
        vec![("p-7".to_string(), "2024-03-16".to_string(), "10:00".to_string())]
    );
    assert!(!booking.is_pending());
}

#[tokio::test]
async fn test_partial_failure_still_navigates() {
    let gateway = Arc::new(FakeGateway::new(Vec::new()).with_steps(Step::Ok, Step::Reject("Patient locked")));
    let booking = BookingTransaction::new(gateway.clone());

    let outcome = booking.book_slot(&selection("10:00"), "p-7", "d-3").await.unwrap();

    let result = outcome.result();
    assert!(result.slot_booked);
    assert!(!result.patient_updated);
    assert_eq!(
        outcome.exit_navigation("d-3"),
        Some(ExitNavigation::ReplaceWithPatientList { doctor_id: "d-3".to_string() })
    );
    assert_ne!(outcome.user_message(), BookingOutcome::Booked.user_message());
    assert_eq!(gateway.booked.lock().unwrap().len(), 1);
    assert!(gateway.stamped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_reservation_stops_before_patient_update() {
    let gateway = Arc::new(FakeGateway::new(Vec::new()).with_steps(Step::Reject("Slot already booked"), Step::Ok));
    let booking = BookingTransaction::new(gateway.clone());

    let outcome = booking.book_slot(&selection("10:00"), "p-7", "d-3").await.unwrap();

    assert_matches!(&outcome, BookingOutcome::Failed(failure)
        if failure.kind == FailureKind::Rejected && failure.message == "Slot already booked");
    assert!(!outcome.result().slot_booked);
    assert!(outcome.exit_navigation("d-3").is_none());
    assert!(gateway.stamped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_offline_reservation_reports_network_error() {
    let gateway = Arc::new(FakeGateway::new(Vec::new()).with_steps(Step::Offline, Step::Ok));
    let booking = BookingTransaction::new(gateway);

    let outcome = booking.book_slot(&selection("10:00"), "p-7", "d-3").await.unwrap();

    assert_matches!(outcome, BookingOutcome::Failed(failure)
        if failure.kind == FailureKind::Transport
            && failure.message == "Network error. Please check your connection.");
}

#[tokio::test]
async fn test_second_submission_rejected_while_pending() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gateway = Arc::new(FakeGateway::holding(Vec::new(), entered.clone(), release.clone()));
    let booking = Arc::new(BookingTransaction::new(gateway.clone()));

    let first = tokio::spawn({
        let booking = booking.clone();
        async move { booking.book_slot(&selection("10:00"), "p-7", "d-3").await }
    });

    entered.notified().await;
    assert!(booking.is_pending());

    assert_matches!(
        booking.book_slot(&selection("10:00"), "p-7", "d-3").await,
        Err(SlotBookingError::BookingInProgress)
    );
    assert_matches!(
        booking.book_slot(&selection("11:30"), "p-7", "d-3").await,
        Err(SlotBookingError::BookingInProgress)
    );

    release.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), BookingOutcome::Booked);
    assert!(!booking.is_pending());
    assert_eq!(gateway.booked.lock().unwrap().len(), 1);

    // Accepted again once the first one resolved.
    let retry = tokio::spawn({
        let booking = booking.clone();
        async move { booking.book_slot(&selection("11:30"), "p-7", "d-3").await }
    });
    entered.notified().await;
    release.notify_one();
    assert_eq!(retry.await.unwrap().unwrap(), BookingOutcome::Booked);
}

#[tokio::test]
async fn test_backend_gateway_wire_contract() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slots.php"))
        .and(query_param("date", "2024-03-16"))
        .and(query_param("weeks", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::slots_response(vec![
            MockBackendResponses::day_slots("2024-03-16", &[("10:00", true), ("10:30", false)]),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/slots.php"))
        .and(body_json(json!({
            "date": "2024-03-16",
            "time": "10:00",
            "doctor_id": "3",
            "patient_id": "7"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/patients.php"))
        .and(body_json(json!({"patient_id": "7", "scan_date": "2024-03-16", "scan_time": "10:00"})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Database unavailable"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), TestUser::doctor("3").session("doc-token"));
    let gateway = Arc::new(BackendSlotGateway::new(client));

    let days = gateway.available_slots("2024-03-16", 2).await.unwrap();
    assert_eq!(days, vec![day("2024-03-16", &[("10:00", true), ("10:30", false)])]);

    let booking = BookingTransaction::new(gateway);
    let outcome = booking.book_slot(&selection("10:00"), "7", "3").await.unwrap();

    assert_matches!(outcome, BookingOutcome::BookedNotLinked { ref reason } if reason == "Database unavailable");
    assert_eq!(outcome.title(), "Partial Success");
}

#[tokio::test]
async fn test_backend_rejection_of_taken_slot() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/slots.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::failure("Slot already booked")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/patients.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), TestUser::doctor("3").session("doc-token"));
    let booking = BookingTransaction::new(Arc::new(BackendSlotGateway::new(client)));

    let outcome = booking.book_slot(&selection("10:00"), "7", "3").await.unwrap();

    assert_eq!(outcome.user_message(), "Slot already booked");
    assert_eq!(outcome.title(), "Error");
}
