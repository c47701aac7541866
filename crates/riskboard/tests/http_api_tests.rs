use riskboard::api::{
  AlertRequest, DashboardApi, EducationLevel, HttpDashboardApi, IncomeLevel, InterventionRequest,
  InterventionType, NewStudent, RiskLevel,
};
use riskboard::{ClientConfig, StoreError};
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> HttpDashboardApi {
  HttpDashboardApi::new(ClientConfig::new(&server.uri(), 5).unwrap()).unwrap()
}

#[tokio::test]
#[serial]
async fn test_list_students_unwraps_envelope() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/students"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "students": [
        {
          "student_id": "STU001",
          "age": 14,
          "attendance_percentage": 58.5,
          "average_marks": 41.0,
          "absences_per_month": 6,
          "distance_to_school_km": 7.5,
          "family_income_level": "Low",
          "parents_education_level": "No Education",
          "health_issues": "Yes",
          "child_labor": 1,
          "has_sibling_dropout": 0,
          "predicted_risk": "High",
          "risk_factors": ["Low attendance", "Child labor"],
          "confidence": 0.91,
          "created_at": "2024-03-01T10:15:00.123456"
        },
        { "student_id": "STU002", "dropout_risk": "medium" }
      ]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let students = api_for(&server).list_students().await.unwrap();

  assert_eq!(students.len(), 2);
  let first = &students[0];
  assert_eq!(first.parents_education_level, EducationLevel::NoEducation);
  assert_eq!(first.family_income_level, IncomeLevel::Low);
  assert!(first.health_issues);
  assert!(first.child_labor);
  assert!(!first.has_sibling_dropout);
  assert!(first.created_at.is_some());
  assert_eq!(students[1].effective_risk(), RiskLevel::Medium);
}

#[tokio::test]
#[serial]
async fn test_generate_sends_sample_count_as_query() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/api/dataset/generate"))
    .and(query_param("n_samples", "150"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "message": "Training dataset generated",
      "total_students": 150
    })))
    .expect(1)
    .mount(&server)
    .await;

  let generated = api_for(&server).generate_dataset(150).await.unwrap();
  assert_eq!(generated.total_records, 150);
}

#[tokio::test]
#[serial]
async fn test_train_extracts_detail_on_rejection() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/api/model/train"))
    .respond_with(
      ResponseTemplate::new(400).set_body_json(json!({ "detail": "No training data found" })),
    )
    .mount(&server)
    .await;

  let err = api_for(&server).train_model().await.unwrap_err();
  assert_eq!(err, StoreError::server(400, "No training data found"));
}

#[tokio::test]
#[serial]
async fn test_train_returns_sorted_metrics() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/api/model/train"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "message": "Model trained successfully",
      "metrics": {
        "accuracy": 0.875,
        "feature_importance": [
          { "feature": "average_marks", "importance": 0.1 },
          { "feature": "attendance_percentage", "importance": 0.6 }
        ],
        "confusion_matrix": [[5, 1, 0], [0, 6, 1], [1, 0, 4]]
      }
    })))
    .mount(&server)
    .await;

  let metrics = api_for(&server).train_model().await.unwrap();
  assert_eq!(metrics.feature_importance[0].feature, "attendance_percentage");
  assert_eq!(metrics.confusion_matrix.unwrap().len(), 3);
}

#[tokio::test]
#[serial]
async fn test_missing_metrics_is_not_found() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/model/metrics"))
    .respond_with(
      ResponseTemplate::new(404).set_body_json(json!({ "detail": "Model has not been trained yet" })),
    )
    .mount(&server)
    .await;

  let err = api_for(&server).get_model_metrics().await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
#[serial]
async fn test_add_student_posts_wire_encoding() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/api/students"))
    .and(body_partial_json(json!({
      "phone_number": "+911234567890",
      "parents_education_level": "Secondary",
      "health_issues": "No",
      "child_labor": 1
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "student_id": "STU151",
      "message": "Student added successfully"
    })))
    .expect(1)
    .mount(&server)
    .await;

  let student = NewStudent {
    phone_number: Some("+911234567890".to_string()),
    age: 13,
    attendance_percentage: 66.0,
    average_marks: 52.0,
    parents_education_level: EducationLevel::Secondary,
    child_labor: true,
    ..NewStudent::default()
  };
  let created = api_for(&server).add_student(&student).await.unwrap();
  assert_eq!(created.student_id.as_deref(), Some("STU151"));
}

#[tokio::test]
#[serial]
async fn test_student_detail_route_and_interventions() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/students/STU001"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "student": { "student_id": "STU001", "predicted_risk": "Low" },
      "interventions": [
        {
          "student_id": "STU001",
          "intervention_type": "Parent Meeting",
          "notes": "Met both parents",
          "created_at": "2024-03-02T09:00:00+00:00"
        }
      ]
    })))
    .mount(&server)
    .await;

  let detail = api_for(&server).get_student("STU001").await.unwrap();
  assert_eq!(detail.interventions.len(), 1);
  assert_eq!(detail.interventions[0].intervention_type, InterventionType::ParentMeeting);
}

#[tokio::test]
#[serial]
async fn test_alert_and_intervention_payloads() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/api/alerts/send"))
    .and(body_partial_json(json!({ "student_id": "STU001", "risk_level": "High" })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "status": "success",
      "sms": { "status": "simulated" }
    })))
    .expect(1)
    .mount(&server)
    .await;

  Mock::given(method("POST"))
    .and(path("/api/interventions"))
    .and(body_partial_json(json!({ "intervention_type": "Financial Aid" })))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({ "message": "Intervention recorded" })),
    )
    .expect(1)
    .mount(&server)
    .await;

  let api = api_for(&server);
  let receipt = api
    .send_alert(&AlertRequest {
      student_id: "STU001".to_string(),
      risk_level: RiskLevel::High,
      phone_number: "+911234567890".to_string(),
      message: "check in".to_string(),
    })
    .await
    .unwrap();
  assert_eq!(receipt.sms.unwrap().status.as_deref(), Some("simulated"));

  api
    .create_intervention(&InterventionRequest {
      student_id: "STU001".to_string(),
      intervention_type: InterventionType::FinancialAid,
      notes: None,
    })
    .await
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_training_count_and_alert_aliases() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/training/count"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 150 })))
    .mount(&server)
    .await;

  Mock::given(method("GET"))
    .and(path("/api/alerts"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "alerts": [{
        "student_id": "STU001",
        "risk_level": "High",
        "phone_number": "+911234567890",
        "message": "hello",
        "sms_status": "simulated",
        "created_at": "2024-03-02T09:00:00Z"
      }]
    })))
    .mount(&server)
    .await;

  let api = api_for(&server);
  assert_eq!(api.training_count().await.unwrap(), 150);

  let alerts = api.list_alerts().await.unwrap();
  assert_eq!(alerts[0].status.as_deref(), Some("simulated"));
  assert!(alerts[0].sent_at.is_some());
}

#[tokio::test]
#[serial]
async fn test_malformed_body_is_server_error() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/stats"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
    .mount(&server)
    .await;

  let err = api_for(&server).get_stats().await.unwrap_err();
  assert_eq!(err.status(), Some(200));
}

#[tokio::test]
#[serial]
async fn test_unreachable_backend_is_network_error() {
  // nothing listens on the discard port
  let api = HttpDashboardApi::new(ClientConfig::new("http://127.0.0.1:9", 2).unwrap()).unwrap();

  let err = api.get_stats().await.unwrap_err();
  assert!(matches!(err, StoreError::Network { .. }));
}
