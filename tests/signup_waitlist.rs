mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};

use common::{test_config, TestApp};

#[tokio::test]
async fn full_activity_waitlists_in_arrival_order() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 2, true).await;

    for (email, status) in [
        ("a@mergington.edu", "enrolled"),
        ("b@mergington.edu", "enrolled"),
        ("c@mergington.edu", "waitlisted"),
        ("d@mergington.edu", "waitlisted"),
    ] {
        let response = app.sign_up("Robotics", &admin, Some(email)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        assert_eq!(response.json()["status"], status);
    }

    let last = app.sign_up("Robotics", &admin, Some("e@mergington.edu")).await;
    assert_eq!(last.json()["waitlist_position"], 3);
    assert_eq!(
        last.json()["message"],
        "e@mergington.edu was added to the waitlist for Robotics (position 3)"
    );

    let activity = app.get("/activities/Robotics", None).await.json();
    assert_eq!(activity["participant_count"], 2);
    assert_eq!(activity["spots_left"], 0);
    assert_eq!(activity["participants"], json!(["a@mergington.edu", "b@mergington.edu"]));
    assert_eq!(
        activity["waitlist"],
        json!(["c@mergington.edu", "d@mergington.edu", "e@mergington.edu"])
    );

    let waitlist = app.get("/activities/Robotics/waitlist", None).await.json();
    assert_eq!(waitlist[0], json!({ "email": "c@mergington.edu", "position": 1 }));
    assert_eq!(waitlist[2], json!({ "email": "e@mergington.edu", "position": 3 }));
}

#[tokio::test]
async fn freed_seat_promotes_the_head_of_the_waitlist() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;

    let ana = app.register("ana@mergington.edu").await;
    let bo = app.register("bo@mergington.edu").await;
    assert_eq!(app.sign_up("Robotics", &ana, None).await.json()["status"], "enrolled");
    assert_eq!(app.sign_up("Robotics", &bo, None).await.json()["status"], "waitlisted");

    let response = app.unregister("Robotics", &ana, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Successfully unregistered ana@mergington.edu from Robotics");
    assert_eq!(body["promoted"], json!(["bo@mergington.edu"]));

    let activity = app.get("/activities/Robotics", None).await.json();
    assert_eq!(activity["participants"], json!(["bo@mergington.edu"]));
    assert_eq!(activity["waitlist_count"], 0);

    let mine = app.get("/me/registrations", Some(&bo)).await.json();
    assert_eq!(mine[0]["activity"], "Robotics");
    assert_eq!(mine[0]["status"], "enrolled");
}

#[tokio::test]
async fn leaving_the_waitlist_promotes_nobody() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("c@mergington.edu")).await;

    let response = app.unregister("Robotics", &admin, Some("b@mergington.edu")).await;
    assert_eq!(response.json()["promoted"], json!([]));

    let waitlist = app.get("/activities/Robotics/waitlist", None).await.json();
    assert_eq!(waitlist, json!([{ "email": "c@mergington.edu", "position": 1 }]));
}

#[tokio::test]
async fn duplicate_signups_are_rejected_with_the_current_status() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;

    let enrolled = app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    assert_eq!(enrolled.status, StatusCode::BAD_REQUEST);
    assert_eq!(enrolled.detail(), "Already signed up for this activity");

    let waitlisted = app.sign_up("Robotics", &admin, Some("B@mergington.edu")).await;
    assert_eq!(waitlisted.status, StatusCode::BAD_REQUEST);
    assert_eq!(waitlisted.detail(), "Already on the waitlist for this activity");
}

#[tokio::test]
async fn full_activity_without_waitlist_rejects() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, false).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;

    let response = app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.detail(), "Activity is full");

    let again = app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.detail(), "Already signed up for this activity");
}

#[tokio::test]
async fn waitlisted_duplicate_after_waitlist_is_closed() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, true).await;
    app.sign_up("Robotics", &admin, Some("a@mergington.edu")).await;
    app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;

    let closed = app
        .call(
            Method::PATCH,
            "/admin/activities/Robotics",
            Some(&admin),
            Some(json!({ "waitlist_enabled": false })),
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK, "{}", closed.text());

    let again = app.sign_up("Robotics", &admin, Some("b@mergington.edu")).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.detail(), "Already on the waitlist for this activity");

    let newcomer = app.sign_up("Robotics", &admin, Some("c@mergington.edu")).await;
    assert_eq!(newcomer.detail(), "Activity is full");
}

#[tokio::test]
async fn students_act_only_for_themselves() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 5, true).await;
    let ana = app.register("ana@mergington.edu").await;

    let other = app.sign_up("Robotics", &ana, Some("bo@mergington.edu")).await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let herself = app.sign_up("Robotics", &ana, Some("ana@mergington.edu")).await;
    assert_eq!(herself.status, StatusCode::OK);

    app.sign_up("Robotics", &admin, Some("bo@mergington.edu")).await;
    let drop_other = app.unregister("Robotics", &ana, Some("bo@mergington.edu")).await;
    assert_eq!(drop_other.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signup_requires_authentication() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 5, true).await;

    let response = app
        .call(Method::POST, "/activities/Robotics/signup", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_activity_and_missing_registration() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 5, true).await;
    let ana = app.register("ana@mergington.edu").await;

    let missing = app.sign_up("Underwater%20Basket", &ana, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.detail(), "Activity not found");

    let get_missing = app.get("/activities/Underwater%20Basket", None).await;
    assert_eq!(get_missing.status, StatusCode::NOT_FOUND);

    let not_registered = app.unregister("Robotics", &ana, None).await;
    assert_eq!(not_registered.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_registered.detail(), "Not signed up for this activity");

    let unregister_missing = app.unregister("Underwater%20Basket", &ana, None).await;
    assert_eq!(unregister_missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messages_follow_accept_language() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 1, false).await;
    let ana = app.register("ana@mergington.edu").await;

    let request = |email: Option<&str>| {
        let body = match email {
            Some(e) => json!({ "email": e }),
            None => json!({}),
        };
        Request::builder()
            .method(Method::POST)
            .uri("/activities/Robotics/signup")
            .header(header::AUTHORIZATION, format!("Bearer {}", ana))
            .header(header::ACCEPT_LANGUAGE, "es-ES,es;q=0.9,en;q=0.5")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let ok = app.send(request(None)).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.header(header::CONTENT_LANGUAGE), "es");
    assert_eq!(
        ok.json()["message"],
        "ana@mergington.edu se inscribió correctamente en Robotics"
    );

    let duplicate = app.send(request(None)).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.detail(), "Ya estás inscrito en esta actividad");

    let english = app.sign_up("Robotics", &ana, None).await;
    assert_eq!(english.header(header::CONTENT_LANGUAGE), "en");
    assert_eq!(english.detail(), "Already signed up for this activity");
}

/// Fires `count` simultaneous admin sign-ups for distinct students.
async fn race_signups(app: &TestApp, admin: &str, activity: &str, count: usize) -> Vec<StatusCode> {
    let mut tasks = Vec::new();
    for i in 0..count {
        let router = app.router.clone();
        let uri = format!("/activities/{}/signup", activity);
        let auth = format!("Bearer {}", admin);
        tasks.push(tokio::spawn(async move {
            use tower::ServiceExt;
            let request = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": format!("s{}@mergington.edu", i) }).to_string(),
                ))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }));
    }

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    statuses
}

fn tally(statuses: &[StatusCode]) -> (usize, usize) {
    let mut ok = 0;
    let mut rejected = 0;
    for status in statuses {
        match *status {
            StatusCode::OK => ok += 1,
            StatusCode::BAD_REQUEST => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    (ok, rejected)
}

async fn file_backed_app(dir: &tempfile::TempDir) -> TestApp {
    TestApp::with_config(mergington::AppConfig {
        database_url: format!("sqlite://{}", dir.path().join("school.db").display()),
        database_max_connections: 5,
        ..test_config()
    })
    .await
}

#[tokio::test]
async fn concurrent_signups_never_exceed_capacity() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 3, false).await;

    let statuses = race_signups(&app, &admin, "Robotics", 12).await;
    assert_eq!(tally(&statuses), (3, 9));

    let activity = app.get("/activities/Robotics", None).await.json();
    assert_eq!(activity["participant_count"], 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn pooled_connections_race_for_the_last_seats() {
    let dir = tempfile::tempdir().unwrap();
    let app = file_backed_app(&dir).await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 3, false).await;

    let statuses = race_signups(&app, &admin, "Robotics", 40).await;
    assert_eq!(tally(&statuses), (3, 37));

    let activity = app.get("/activities/Robotics", None).await.json();
    assert_eq!(activity["participant_count"], 3);
    assert_eq!(activity["waitlist_count"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn pooled_connections_overflow_into_the_waitlist() {
    let dir = tempfile::tempdir().unwrap();
    let app = file_backed_app(&dir).await;
    let admin = app.admin_token().await;
    app.create_activity(&admin, "Robotics", 3, true).await;

    let statuses = race_signups(&app, &admin, "Robotics", 40).await;
    assert_eq!(tally(&statuses), (40, 0));

    let activity = app.get("/activities/Robotics", None).await.json();
    assert_eq!(activity["participant_count"], 3);
    assert_eq!(activity["waitlist_count"], 37);

    let waitlist = app.get("/activities/Robotics/waitlist", None).await.json();
    let positions: Vec<i64> = waitlist
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, (1..=37).collect::<Vec<_>>());
}

#[tokio::test]
async fn default_catalogue_is_seeded() {
    let app = TestApp::with_config(mergington::AppConfig {
        seed_activities: true,
        ..test_config()
    })
    .await;

    let activities: Value = app.get("/activities", None).await.json();
    let list = activities.as_array().unwrap();
    assert_eq!(list.len(), 9);
    assert_eq!(list[0]["name"], "Art Club");

    let chess = list.iter().find(|a| a["name"] == "Chess Club").unwrap();
    assert_eq!(chess["max_participants"], 12);
    assert_eq!(
        chess["participants"],
        json!(["michael@mergington.edu", "daniel@mergington.edu"])
    );
    assert_eq!(chess["schedule"], "Fridays, 3:30 PM - 5:00 PM");
}
