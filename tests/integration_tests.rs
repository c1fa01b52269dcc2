use httpmock::prelude::*;
use lecture_portal::attendance::AttendanceController;
use lecture_portal::client::PortalClient;
use lecture_portal::error::{ErrorKind, PortalError};
use lecture_portal::form::{LectureForm, SubmitOutcome};
use lecture_portal::list::{ClassFilter, LectureList, LoadState};
use lecture_portal::models::{Decision, LectureField, MediaSlot, PendingFile, RequestStatus};
use lecture_portal::notify::Level;
use lecture_portal::requests::{RequestBoard, RequestForm};
use lecture_portal::session::{AdminSession, StudentSession};
use serde_json::{Value, json};
use url::Url;

/// Helper function to create a client pointed at the mock server
fn create_client(server: &MockServer) -> PortalClient {
    PortalClient::new(Url::parse(&server.base_url()).unwrap())
}

fn lectures_json() -> Value {
    json!([
        {"_id": "l1", "topic": "Computer Networks", "resourcePerson": "Dr. Rao", "class": "CSE-A"},
        {"_id": "l2", "topic": "Network Security", "resourcePerson": "Ms. Kaur", "class": "CSE-B"},
        {"_id": "l3", "topic": "Cloud Computing", "resourcePerson": "Dr. X", "class": "CSE-A", "banner": "b.png"},
        {"_id": "l4", "topic": "Soft Skills", "resourcePerson": "Mr. Network Admin", "class": "CSE-A"}
    ])
}

fn request_json(status: &str, comments: Option<&str>) -> Value {
    json!([{
        "_id": "r1",
        "studentRollNumber": "2101",
        "type": "add",
        "lectureTitle": "Quantum Computing",
        "lectureDate": "2025-03-01T10:00",
        "description": "Invite Dr. Q",
        "status": status,
        "adminComments": comments
    }])
}

async fn loaded_list(server: &MockServer, client: &PortalClient) -> LectureList {
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures");
        then.status(200).json_body(lectures_json());
    });
    let mut list = LectureList::new();
    list.refresh(client).await.unwrap();
    list
}

#[tokio::test]
async fn test_list_refresh_and_filter_by_class_and_query() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let mut list = loaded_list(&server, &client).await;

    // Act
    list.set_class_filter(ClassFilter::Class("CSE-A".into()));
    list.set_query("network");
    let ids: Vec<&str> = list.filtered().iter().map(|l| l.id.as_str()).collect();

    // Assert
    assert_eq!(list.state(), LoadState::Ready);
    assert_eq!(ids, vec!["l1", "l4"]);
    assert_eq!(
        list.class_options(),
        vec![
            ClassFilter::All,
            ClassFilter::Class("CSE-A".into()),
            ClassFilter::Class("CSE-B".into()),
        ]
    );
}

#[tokio::test]
async fn test_list_refresh_failure_is_notified() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures");
        then.status(500);
    });
    let mut list = LectureList::new();

    // Act
    let err = list.refresh(&client).await.unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(list.state(), LoadState::Failed);
    assert!(list.lectures().is_empty());
    assert_eq!(list.notices().drain()[0].level, Level::Error);
}

#[tokio::test]
async fn test_confirmed_delete_removes_lecture() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let mut list = loaded_list(&server, &client).await;
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/lectures/l2");
        then.status(204);
    });

    // Act
    list.request_delete("l2").unwrap();
    list.confirm_delete(&client).await.unwrap();

    // Assert
    delete.assert();
    assert!(list.find("l2").is_none());
    assert!(!list.is_deleting("l2"));
    assert_eq!(list.lectures().len(), 3);
    assert!(!list.class_options().contains(&ClassFilter::Class("CSE-B".into())));
}

#[tokio::test]
async fn test_failed_delete_keeps_lecture() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let mut list = loaded_list(&server, &client).await;
    server.mock(|when, then| {
        when.method(DELETE).path("/api/lectures/l1");
        then.status(404).json_body(json!({"message": "Lecture not found"}));
    });

    // Act
    list.request_delete("l1").unwrap();
    let err = list.confirm_delete(&client).await.unwrap_err();

    // Assert
    assert!(matches!(err, PortalError::NotFound(_)));
    assert!(list.find("l1").is_some());
    assert!(!list.is_deleting("l1"));
    assert_eq!(list.notices().drain().last().unwrap().message, "Lecture not found");
}

#[tokio::test]
async fn test_cancelled_delete_sends_nothing() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let mut list = loaded_list(&server, &client).await;
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/lectures/l1");
        then.status(204);
    });

    // Act
    list.request_delete("l1").unwrap();
    list.cancel_delete();
    let result = list.confirm_delete(&client).await;

    // Assert
    assert!(result.is_err());
    delete.assert_calls(0);
    assert!(list.find("l1").is_some());
}

#[tokio::test]
async fn test_add_lecture_with_banner_then_fetch_by_id() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/lectures")
            .body_includes(r#"name="topic""#)
            .body_includes("Cloud Computing")
            .body_includes(r#"name="banner"; filename="file1.png""#);
        then.status(201).json_body(json!({
            "_id": "new-1",
            "topic": "Cloud Computing",
            "resourcePerson": "Dr. X",
            "banner": "1700000000-file1.png"
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures/new-1");
        then.status(200).json_body(json!({
            "_id": "new-1",
            "topic": "Cloud Computing",
            "resourcePerson": "Dr. X",
            "banner": "1700000000-file1.png"
        }));
    });

    let mut form = LectureForm::add();
    form.set_field(LectureField::Topic, "Cloud Computing");
    form.set_field(LectureField::ResourcePerson, "Dr. X");
    form.select_file(MediaSlot::Banner, PendingFile::new("file1.png", vec![0x89, 0x50]));

    // Act
    let outcome = form.submit(&client).await.unwrap();

    // Assert
    create.assert();
    let SubmitOutcome::Created(created) = outcome else {
        panic!("expected a created lecture");
    };
    assert_eq!(created.id, "new-1");
    assert!(created.media(MediaSlot::Banner).is_some());
    assert_eq!(form.draft().topic, "");
    assert!(form.attachments().is_empty());
    assert_eq!(form.notices().drain()[0].level, Level::Success);

    let fetched = client.get_lecture(&created.id).await.unwrap();
    assert_eq!(fetched.fields.topic, "Cloud Computing");
}

#[tokio::test]
async fn test_add_without_required_fields_never_dispatches() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/lectures");
        then.status(201);
    });
    let mut form = LectureForm::add();
    form.set_field(LectureField::ResourcePerson, "Dr. X");

    // Act
    let err = form.submit(&client).await.unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Validation);
    create.assert_calls(0);
    assert_eq!(form.draft().resource_person, "Dr. X");
}

#[tokio::test]
async fn test_edit_loads_and_resubmits_full_record() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures/l3");
        then.status(200).json_body(json!({
            "_id": "l3",
            "topic": "Cloud Computing",
            "resourcePerson": "Dr. X",
            "company": "Acme",
            "class": "CSE-A",
            "banner": "b.png"
        }));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/lectures/l3")
            .body_includes(r#"name="company""#)
            .body_includes("Acme")
            .body_includes(r#"name="class""#)
            .body_includes("CSE-A")
            .body_includes("Serverless Computing")
            .body_excludes(r#"name="banner""#)
            .body_excludes(r#"name="images""#);
        then.status(200).json_body(json!({
            "_id": "l3",
            "topic": "Serverless Computing",
            "resourcePerson": "Dr. X",
            "company": "Acme",
            "class": "CSE-A",
            "banner": "b.png"
        }));
    });
    let mut form = LectureForm::edit("l3");
    assert!(form.is_loading());

    // Act
    form.load(&client).await.unwrap();
    form.set_field(LectureField::Topic, "Serverless Computing");
    let outcome = form.submit(&client).await.unwrap();

    // Assert
    update.assert();
    assert!(matches!(outcome, SubmitOutcome::Updated(_)));
    assert!(!form.is_loading());
    assert_eq!(form.draft().topic, "Serverless Computing");
    assert_eq!(form.draft().company, "Acme");
    assert!(form.preview(&client, MediaSlot::Banner).is_some());
}

#[tokio::test]
async fn test_edit_with_new_banner_sends_only_that_file() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures/l3");
        then.status(200).json_body(json!({
            "_id": "l3",
            "topic": "Cloud Computing",
            "resourcePerson": "Dr. X",
            "banner": "b.png",
            "images": "i.png"
        }));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/lectures/l3")
            .body_includes(r#"name="banner"; filename="new-banner.png""#)
            .body_excludes(r#"name="images""#);
        then.status(200).json_body(json!({
            "_id": "l3",
            "topic": "Cloud Computing",
            "resourcePerson": "Dr. X",
            "banner": "1700000001-new-banner.png",
            "images": "i.png"
        }));
    });
    let mut form = LectureForm::edit("l3");

    // Act
    form.load(&client).await.unwrap();
    form.select_file(MediaSlot::Banner, PendingFile::new("new-banner.png", vec![0x89, 0x50]));
    let outcome = form.submit(&client).await.unwrap();

    // Assert
    update.assert();
    let SubmitOutcome::Updated(updated) = outcome else {
        panic!("expected an updated lecture");
    };
    assert_eq!(updated.banner.as_deref(), Some("1700000001-new-banner.png"));
}

#[tokio::test]
async fn test_edit_of_missing_lecture_reports_not_found() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures/gone");
        then.status(404);
    });
    let mut form = LectureForm::edit("gone");

    // Act
    let err = form.load(&client).await.unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!form.is_loading());
}

#[tokio::test]
async fn test_failed_update_preserves_draft() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures/l1");
        then.status(200)
            .json_body(json!({"_id": "l1", "topic": "Networks", "resourcePerson": "Dr. Rao"}));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/api/lectures/l1");
        then.status(503);
    });
    let mut form = LectureForm::edit("l1");
    form.load(&client).await.unwrap();
    form.set_field(LectureField::Venue, "Seminar Hall");

    // Act
    let err = form.submit(&client).await.unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(form.draft().venue, "Seminar Hall");
    assert_eq!(form.draft().topic, "Networks");
}

#[tokio::test]
async fn test_attendance_marks_selected_classes() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let classes = server.mock(|when, then| {
        when.method(GET)
            .path("/api/classes")
            .query_param("excludeAttendedForLecture", "l1");
        then.status(200).json_body(json!([
            {"_id": "C1", "name": "BCA 1"},
            {"_id": "C2", "name": "BCA 2"},
            {"_id": "C3", "name": "BCA 3"}
        ]));
    });
    let mark = server.mock(|when, then| {
        when.method(POST).path("/api/class-attendance/mark");
        then.status(200).json_body(json!({"message": "ok"}));
    });
    let mut controller = AttendanceController::new(false);

    // Act
    controller.select_lecture(&client, "l1").await.unwrap();
    controller.toggle("C1");
    controller.toggle("C3");
    let batch = controller.pending_batch().unwrap();
    controller.submit(&client).await.unwrap();

    // Assert
    classes.assert();
    mark.assert();
    assert_eq!(batch.attended_classes, vec!["C1", "C3"]);
    let remaining: Vec<&str> = controller.classes().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(remaining, vec!["C2"]);
    assert!(controller.selected_ids().is_empty());
}

#[tokio::test]
async fn test_attendance_without_selection_never_dispatches() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/classes");
        then.status(200).json_body(json!([{"_id": "C1", "name": "BCA 1"}]));
    });
    let mark = server.mock(|when, then| {
        when.method(POST).path("/api/class-attendance/mark");
        then.status(200);
    });
    let mut controller = AttendanceController::new(false);
    controller.select_lecture(&client, "l1").await.unwrap();

    // Act
    let err = controller.submit(&client).await.unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Validation);
    mark.assert_calls(0);
    assert_eq!(
        controller.notices().drain()[0].message,
        "Please select at least one class."
    );
}

#[tokio::test]
async fn test_attendance_failure_leaves_state_unchanged() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/classes");
        then.status(200)
            .json_body(json!([{"_id": "C1", "name": "BCA 1"}, {"_id": "C2", "name": "BCA 2"}]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/class-attendance/mark");
        then.status(500);
    });
    let mut controller = AttendanceController::new(false);
    controller.select_lecture(&client, "l1").await.unwrap();
    controller.toggle("C2");

    // Act
    let result = controller.submit(&client).await;

    // Assert
    assert!(result.is_err());
    assert_eq!(controller.classes().len(), 2);
    assert!(controller.is_selected("C2"));
}

#[tokio::test]
async fn test_attendance_refetch_after_submit() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let mut classes = server.mock(|when, then| {
        when.method(GET).path("/api/classes");
        then.status(200)
            .json_body(json!([{"_id": "C1", "name": "BCA 1"}, {"_id": "C2", "name": "BCA 2"}]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/class-attendance/mark");
        then.status(200);
    });
    let mut controller = AttendanceController::new(true);
    controller.select_lecture(&client, "l1").await.unwrap();
    controller.toggle("C1");

    // The server now reports only the class still eligible.
    classes.delete();
    classes = server.mock(|when, then| {
        when.method(GET).path("/api/classes");
        then.status(200).json_body(json!([{"_id": "C2", "name": "BCA 2"}]));
    });

    // Act
    controller.submit(&client).await.unwrap();

    // Assert
    classes.assert();
    assert_eq!(controller.classes().len(), 1);
    assert_eq!(controller.classes()[0].id, "C2");
}

#[tokio::test]
async fn test_attendance_lecture_picker() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lectures");
        then.status(200).json_body(lectures_json());
    });
    let mut controller = AttendanceController::new(false);

    // Act
    controller.load_lectures(&client).await.unwrap();

    // Assert
    let options = controller.lecture_options();
    assert_eq!(options.len(), 4);
    assert_eq!(options[0], ("l1", "Computer Networks - CSE-A".to_string()));
}

#[tokio::test]
async fn test_request_approval_flow() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let session = AdminSession::new("admin-token");
    let mut listing = server.mock(|when, then| {
        when.method(GET)
            .path("/api/lecture-requests")
            .header("authorization", "Bearer admin-token");
        then.status(200).json_body(request_json("pending", None));
    });
    let approve = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/lecture-requests/r1/approve")
            .header("authorization", "Bearer admin-token");
        then.status(200).json_body(json!({"message": "Request approved"}));
    });
    let mut board = RequestBoard::new();
    board.refresh(&client, &session).await.unwrap();
    listing.delete();
    listing = server.mock(|when, then| {
        when.method(GET).path("/api/lecture-requests");
        then.status(200).json_body(request_json("approved", Some("ok")));
    });

    // Act
    board.begin_decision("r1", Decision::Approve).unwrap();
    board.confirm_decision().unwrap();
    board
        .submit_decision(&client, &session, Some("ok"))
        .await
        .unwrap();

    // Assert
    approve.assert();
    listing.assert();
    let request = board.find("r1").unwrap();
    assert_eq!(request.status, RequestStatus::Approved);
    assert_eq!(request.admin_comments.as_deref(), Some("ok"));
    assert!(RequestBoard::available_actions(request).is_empty());
    assert!(board.begin_decision("r1", Decision::Approve).is_err());
}

#[tokio::test]
async fn test_failed_decision_leaves_list_unchanged() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let session = AdminSession::new("admin-token");
    server.mock(|when, then| {
        when.method(GET).path("/api/lecture-requests");
        then.status(200).json_body(request_json("pending", None));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/api/lecture-requests/r1/reject");
        then.status(500);
    });
    let mut board = RequestBoard::new();
    board.refresh(&client, &session).await.unwrap();

    // Act
    board.begin_decision("r1", Decision::Reject).unwrap();
    board.confirm_decision().unwrap();
    let result = board.submit_decision(&client, &session, None).await;

    // Assert
    assert!(result.is_err());
    assert!(board.find("r1").unwrap().is_pending());
    assert_eq!(
        board.notices().drain().last().unwrap().message,
        "Failed to update request status."
    );
}

#[tokio::test]
async fn test_expired_admin_token_is_an_authorization_failure() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/lecture-requests");
        then.status(401).json_body(json!({"message": "jwt expired"}));
    });
    let mut board = RequestBoard::new();

    // Act
    let err = board
        .refresh(&client, &AdminSession::new("stale"))
        .await
        .unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(
        board.notices().drain()[0].message,
        "Session expired, please log in again"
    );
}

#[tokio::test]
async fn test_blank_admin_token_is_never_sent() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let listing = server.mock(|when, then| {
        when.method(GET).path("/api/lecture-requests");
        then.status(200).json_body(json!([]));
    });
    let decide = server.mock(|when, then| {
        when.method(PUT).path("/api/lecture-requests/r1/approve");
        then.status(200);
    });
    let session = AdminSession::new("");
    let mut board = RequestBoard::new();

    // Act
    let listed = board.refresh(&client, &session).await;
    let decided = client
        .decide_request(&session, "r1", Decision::Approve, "")
        .await;

    // Assert
    assert_eq!(listed.unwrap_err().kind(), ErrorKind::Authorization);
    assert_eq!(decided.unwrap_err().kind(), ErrorKind::Authorization);
    listing.assert_calls(0);
    decide.assert_calls(0);
}

#[tokio::test]
async fn test_student_request_submission() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/lecture-requests");
        then.status(201).json_body(json!({
            "_id": "r9",
            "studentRollNumber": "2101",
            "type": "edit",
            "lectureTitle": "Networks",
            "lectureDate": "2025-03-01T10:00",
            "description": "Move to Friday",
            "status": "pending"
        }));
    });
    let session = client_student_session();
    let mut form = RequestForm::new();
    form.kind = lecture_portal::models::RequestKind::Edit;
    form.lecture_title = "Networks".into();
    form.lecture_date = "2025-03-01T10:00".into();
    form.description = "Move to Friday".into();

    // Act
    let created = form.submit(&client, Some(&session)).await.unwrap();

    // Assert
    create.assert();
    assert_eq!(created.status, RequestStatus::Pending);
    assert!(form.lecture_title.is_empty());
    assert_eq!(
        form.notices().drain()[0].message,
        "Request submitted successfully! Waiting for admin approval."
    );
}

fn client_student_session() -> StudentSession {
    StudentSession {
        student: lecture_portal::models::Student {
            roll_number: "2101".into(),
            name: "Asha".into(),
        },
    }
}

#[tokio::test]
async fn test_logins_issue_sessions() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/admin/login");
        then.status(200).json_body(json!({"token": "jwt-abc"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/student/login");
        then.status(200)
            .json_body(json!({"student": {"rollNumber": "2101", "name": "Asha"}}));
    });

    // Act
    let admin = client.admin_login("admin@college.edu", "secret").await.unwrap();
    let student = client.student_login("2101", "Asha").await.unwrap();

    // Assert
    assert_eq!(admin.token(), "jwt-abc");
    assert_eq!(student.student.roll_number, "2101");
}

#[tokio::test]
async fn test_rejected_login_carries_server_message() {
    // Arrange
    let server = MockServer::start();
    let client = create_client(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/admin/login");
        then.status(401).json_body(json!({"message": "Invalid credentials"}));
    });

    // Act
    let err = client.admin_login("admin@college.edu", "wrong").await.unwrap_err();

    // Assert
    assert!(matches!(err, PortalError::Authorization(ref msg) if msg == "Invalid credentials"));
}
