mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn admin_routes_need_an_admin() {
    let app = TestApp::spawn().await;
    let student = app.register("ana@mergington.edu").await;

    let anonymous = app.get("/admin/users", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let forbidden = app.get("/admin/users", Some(&student)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.detail(), "Not allowed to perform this action");

    let create = app
        .post(
            "/admin/activities",
            Some(&student),
            json!({ "name": "X", "description": "x", "schedule": "Mondays, 3 PM - 4 PM", "max_participants": 3 }),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_activity_validates_input() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let created = app
        .post(
            "/admin/activities",
            Some(&admin),
            json!({
                "name": "Robotics",
                "description": "Build robots",
                "schedule": "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                "max_participants": 8
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.json();
    assert_eq!(body["name"], "Robotics");
    assert_eq!(body["waitlist_enabled"], true);
    assert_eq!(body["spots_left"], 8);

    let duplicate = app
        .post(
            "/admin/activities",
            Some(&admin),
            json!({ "name": "Robotics", "description": "again", "schedule": "Fridays, 3 PM - 4 PM", "max_participants": 8 }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.detail(), "Activity already exists");

    let zero = app
        .post(
            "/admin/activities",
            Some(&admin),
            json!({ "name": "Nothing", "description": "x", "schedule": "Fridays, 3 PM - 4 PM", "max_participants": 0 }),
        )
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.detail(), "max_participants must be at least 1");

    let bad_schedule = app
        .post(
            "/admin/activities",
            Some(&admin),
            json!({ "name": "Whenever", "description": "x", "schedule": "sometimes", "max_participants": 4 }),
        )
        .await;
    assert_eq!(bad_schedule.status, StatusCode::BAD_REQUEST);
    assert!(bad_schedule.detail().starts_with("Invalid schedule"));

    let blank_name = app
        .post(
            "/admin/activities",
            Some(&admin),
            json!({ "name": "  ", "description": "x", "schedule": "Fridays, 3 PM - 4 PM", "max_participants": 4 }),
        )
        .await;
    assert_eq!(blank_name.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn raising_capacity_promotes_the_waitlist() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    for email in ["a@mergington.edu", "b@mergington.edu", "c@mergington.edu"] {
        app.sign_up("Robotics", &admin, Some(email)).await;
    }

    let response = app
        .call(
            Method::PATCH,
            "/admin/activities/Robotics",
            Some(&admin),
            Some(json!({ "max_participants": 2, "description": "Bigger room" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let body = response.json();
    assert_eq!(body["description"], "Bigger room");
    assert_eq!(body["participants"], json!(["a@mergington.edu", "b@mergington.edu"]));
    assert_eq!(body["waitlist"], json!(["c@mergington.edu"]));
}

#[tokio::test]
async fn capacity_cannot_drop_below_enrollment() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 3, true).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;

    let response = app
        .call(
            Method::PATCH,
            "/admin/activities/Robotics",
            Some(&admin),
            Some(json!({ "max_participants": 1 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.detail(),
        "max_participants cannot be lower than the current enrollment (2)"
    );

    let unchanged = app.get("/activities/Robotics", None).await.json();
    assert_eq!(unchanged["max_participants"], 3);

    let missing = app
        .call(
            Method::PATCH,
            "/admin/activities/Nope",
            Some(&admin),
            Some(json!({ "max_participants": 5 })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_an_activity_notifies_registrants() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    let ana = app.register("ana@mergington.edu").await;
    let bo = app.register("bo@mergington.edu").await;
    app.sign_up("Robotics", &ana, None).await;
    app.sign_up("Robotics", &bo, None).await;

    let response = app
        .call(Method::DELETE, "/admin/activities/Robotics", Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/activities/Robotics", None).await.status, StatusCode::NOT_FOUND);

    for token in [&ana, &bo] {
        let notes = app.get("/notifications", Some(token)).await.json();
        assert_eq!(notes[0]["kind"], "activity_cancelled");
        assert_eq!(notes[0]["message"], "Robotics has been cancelled.");
        let mine = app.get("/me/registrations", Some(token)).await.json();
        assert_eq!(mine, json!([]));
    }

    let again = app
        .call(Method::DELETE, "/admin/activities/Robotics", Some(&admin), None)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roles_can_be_listed_and_changed() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.register("ana@mergington.edu").await;

    let users = app.get("/admin/users", Some(&admin)).await.json();
    let ana = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "ana@mergington.edu")
        .unwrap();
    assert_eq!(ana["role"], "student");
    assert!(ana.get("password_hash").is_none());

    let promoted = app
        .call(
            Method::PUT,
            "/admin/users/ana@mergington.edu/role",
            Some(&admin),
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.json()["role"], "admin");

    let unknown_role = app
        .call(
            Method::PUT,
            "/admin/users/ana@mergington.edu/role",
            Some(&admin),
            Some(json!({ "role": "janitor" })),
        )
        .await;
    assert_eq!(unknown_role.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_role.detail(), "Unknown role: janitor");

    let unknown_user = app
        .call(
            Method::PUT,
            "/admin/users/ghost@mergington.edu/role",
            Some(&admin),
            Some(json!({ "role": "student" })),
        )
        .await;
    assert_eq!(unknown_user.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registrations_export_as_csv_and_json() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;

    let csv = app.get("/admin/export/registrations", Some(&admin)).await;
    assert_eq!(csv.status, StatusCode::OK);
    assert!(csv.header(header::CONTENT_TYPE).starts_with("text/csv"));
    assert_eq!(
        csv.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"registrations.csv\""
    );
    let text = csv.text();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert_eq!(lines[0], "activity,email,status,waitlist_position,registered_at");
    assert!(lines[1].starts_with("Robotics,a@mergington.edu,enrolled,,"));
    assert!(lines[2].starts_with("Robotics,b@mergington.edu,waitlisted,1,"));

    let json = app
        .get("/admin/export/registrations?format=json", Some(&admin))
        .await;
    assert_eq!(json.status, StatusCode::OK);
    let records = json.json();
    assert_eq!(records[1]["email"], "b@mergington.edu");
    assert_eq!(records[1]["waitlist_position"], 1);
    assert_eq!(records[0]["waitlist_position"], serde_json::Value::Null);

    let bad = app
        .get("/admin/export/registrations?format=xlsx", Some(&admin))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.detail(), "Unsupported export format: xlsx");
}

#[tokio::test]
async fn admin_panel_renders_html() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics & Coding", 4, true).await;

    let response = app.get("/admin", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header(header::CONTENT_TYPE).starts_with("text/html"));
    let html = response.text();
    assert!(html.contains("Robotics &amp; Coding"));
    assert!(html.contains("1 registered accounts"));
}
