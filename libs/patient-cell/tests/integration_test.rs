use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{
    CreatePatientRequest, PatientStatus, UpdatePatientRequest, UploadBundle, UploadFile, UploadKind,
};
use patient_cell::services::{PatientService, UploadService};
use shared_models::AppError;
use shared_utils::test_utils::{test_client, MockBackendResponses, TestUser};

async fn setup() -> (MockServer, PatientService, UploadService) {
    let server = MockServer::start().await;
    let session = TestUser::doctor("3").session("doctor-token");
    let client = test_client(&server.uri(), session);
    (server, PatientService::new(client.clone()), UploadService::new(client))
}

#[tokio::test]
async fn test_list_for_doctor_sends_doctor_scope() {
    let (server, patients, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/patients.php"))
        .and(query_param("doctor_id", "3"))
        .and(query_param("user_type", "doctor"))
        .and(header("authorization", "Bearer doctor-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "patients": [
                MockBackendResponses::patient_response(10, 3, "pending"),
                MockBackendResponses::patient_response(11, 3, "scanned"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = patients.list_for_doctor("3").await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "10");
    assert_eq!(list[1].status, PatientStatus::Scanned);
}

#[tokio::test]
async fn test_list_for_a1_filters_and_orders() {
    let (server, patients, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/patients.php"))
        .and(query_param("user_type", "a1_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "patients": [
                MockBackendResponses::scheduled_patient(1, "scanned", "2024-03-20", "11:00"),
                MockBackendResponses::patient_response(2, 3, "pending"),
                MockBackendResponses::scheduled_patient(3, "completed", "2024-03-18", "16:30"),
            ]
        })))
        .mount(&server)
        .await;

    let list = patients.list_for_a1().await.unwrap();

    let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1"]);
}

#[tokio::test]
async fn test_details_and_missing_patient() {
    let (server, patients, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/patients.php"))
        .and(query_param("patient_id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "patient": MockBackendResponses::patient_response(10, 3, "pending")
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/patients.php"))
        .and(query_param("patient_id", "99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::failure("Patient not found")))
        .mount(&server)
        .await;

    let patient = patients.details("10").await.unwrap();
    assert_eq!(patient.name, "Asha Verma");
    assert_eq!(patient.age, Some(29));

    let err = patients.details("99").await.unwrap_err();
    assert_eq!(err.user_message("Failed to load patient details"), "Patient not found");
}

#[tokio::test]
async fn test_create_posts_normalized_body() {
    let (server, patients, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/patients.php"))
        .and(body_json(json!({
            "doctor_id": "3",
            "name": "Asha Verma",
            "contact_number": "9876543210",
            "location": "12 MG Road, Pune",
            "age": null,
            "gender": "female",
            "chief_complaint": "Crowding",
            "medical_history": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "patient_id": 44})))
        .expect(1)
        .mount(&server)
        .await;

    let created = patients
        .create(CreatePatientRequest {
            doctor_id: "3".to_string(),
            name: "Asha Verma".to_string(),
            contact_number: "98765-43210".to_string(),
            location: "12 MG Road, Pune".to_string(),
            age: None,
            gender: "female".parse().unwrap(),
            chief_complaint: "Crowding ".to_string(),
            medical_history: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(created.as_deref(), Some("44"));
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let (server, patients, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/patients.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(0)
        .mount(&server)
        .await;

    let result = patients
        .create(CreatePatientRequest {
            doctor_id: "3".to_string(),
            name: "Jo".to_string(),
            contact_number: "5555555555".to_string(),
            location: "Pune".to_string(),
            ..Default::default()
        })
        .await;

    assert_matches!(result, Err(AppError::Validation(_)));
}

#[tokio::test]
async fn test_update_puts_only_schedule_fields() {
    let (server, patients, _) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/patients.php"))
        .and(body_json(json!({"patient_id": "10", "scan_date": "2024-03-15", "scan_time": "14:30"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;

    patients
        .update(UpdatePatientRequest::schedule("10", "2024-03-15", "14:30"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_sends_multipart_fields() {
    let (server, _, uploads) = setup().await;

    Mock::given(method("POST"))
        .and(path("/uploads.php"))
        .and(body_string_contains("name=\"patient_id\""))
        .and(body_string_contains("name=\"photos[]\"; filename=\"front.jpg\""))
        .and(body_string_contains("doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = UploadBundle::doctor_photos(vec![UploadFile::new(UploadKind::Image, "front.jpg", b"jpeg-bytes".to_vec())]);
    uploads.upload("10", bundle).await.unwrap();
}

#[tokio::test]
async fn test_upload_rejects_oversized_file_locally() {
    let (server, _, uploads) = setup().await;

    Mock::given(method("POST"))
        .and(path("/uploads.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::ok()))
        .expect(0)
        .mount(&server)
        .await;

    let report = UploadFile::new(UploadKind::Report, "report.pdf", vec![0; 10 * 1024 * 1024 + 1]);
    let result = uploads.upload("10", UploadBundle::lab(None, Some(report))).await;

    assert_matches!(result, Err(AppError::Validation(msg)) if msg.contains("10 MB"));
}

#[tokio::test]
async fn test_delete_photo_surfaces_backend_error() {
    let (server, _, uploads) = setup().await;

    Mock::given(method("POST"))
        .and(path("/uploads.php"))
        .and(body_string_contains("delete_photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::failure("Photo not found")))
        .mount(&server)
        .await;

    let err = uploads.delete_photo("10", "uploads/p9.jpg").await.unwrap_err();

    assert_matches!(err, AppError::Rejected { message: Some(ref msg), .. } if msg == "Photo not found");
    assert!(uploads.file_url("uploads/a b.pdf").ends_with("file_path=uploads%2Fa%20b.pdf"));
}
