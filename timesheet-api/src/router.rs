use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    auth::USER_ID_HEADER,
    config::ApplicationSettings,
    routes,
};

pub fn create(app_state: AppState, config: &ApplicationSettings) -> Router<()> {
    let app = Router::new()
        .route("/", get(|| async { "Timesheets API" }))
        .nest("/timesheets", routes::timesheets::router())
        .nest("/projects", routes::projects::router());

    let app_url = config.app_url.clone();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _| origin.as_bytes() == app_url.as_bytes(),
        ));

    app.with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use time::macros::{date, datetime};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        adapters::outbound::memory::{FixedClock, MemoryDirectory, MemoryTimesheetRepository},
        domain::{
            models::{Project, TimesheetStatus, User},
            services::TimesheetServiceImpl,
        },
    };

    struct TestApp {
        router: Router<()>,
        repo: MemoryTimesheetRepository,
    }

    fn app() -> TestApp {
        let repo = MemoryTimesheetRepository::new();
        let directory = MemoryDirectory::new()
            .with_user(User::new(1, "Alice Andersson"))
            .with_user(User::new(2, "Bob Berg"))
            .with_project(Project::new(1, "Atlas").with_activity_types(["Dev", "Review"]));
        let service = TimesheetServiceImpl::new(
            Arc::new(repo.clone()),
            Arc::new(directory),
            Arc::new(FixedClock::at(datetime!(2025-08-08 15:30 UTC))),
        );
        let settings = ApplicationSettings {
            port: 0,
            host: "127.0.0.1".to_string(),
            app_url: "http://localhost:5173".to_string(),
            utc_offset_hours: 0,
        };

        TestApp {
            router: create(AppState::new(Arc::new(service)), &settings),
            repo,
        }
    }

    fn request(method: Method, uri: &str, user: Option<i32>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create_draft(app: &TestApp, date: &str, activity: &str, hours: f64) -> Value {
        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/timesheets",
                Some(1),
                Some(json!({
                    "projectId": 1,
                    "activityType": activity,
                    "date": date,
                    "hoursWorked": hours,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn requests_without_identity_are_rejected() {
        let app = app();
        let (status, body) = send(
            &app,
            request(Method::GET, "/timesheets/drafts", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn creates_and_fetches_a_draft() {
        let app = app();
        let created = create_draft(&app, "2025-08-04", " Dev ", 7.5).await;

        assert_eq!(created["status"], "draft");
        assert_eq!(created["activityType"], "Dev");
        assert_eq!(created["hoursWorked"], 7.5);
        assert_eq!(created["projectName"], "Atlas");

        let uri = format!("/timesheets/{}", created["id"]);
        let (status, fetched) = send(&app, request(Method::GET, &uri, Some(1), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], created["id"]);

        let (status, _) = send(&app, request(Method::GET, &uri, Some(2), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_dates_are_bad_requests() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets",
                Some(1),
                Some(json!({
                    "projectId": 1,
                    "activityType": "Dev",
                    "date": "04/08/2025",
                    "hoursWorked": 8,
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn duplicate_create_reports_existing_id() {
        let app = app();
        let created = create_draft(&app, "2025-08-04", "Dev", 4.0).await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets",
                Some(1),
                Some(json!({
                    "projectId": 1,
                    "activityType": "Dev",
                    "date": "2025-08-04",
                    "hoursWorked": 2,
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["existingId"], created["id"]);
    }

    #[tokio::test]
    async fn update_rejects_unknown_fields_and_status_changes() {
        let app = app();
        let created = create_draft(&app, "2025-08-04", "Dev", 4.0).await;
        let uri = format!("/timesheets/{}", created["id"]);

        let (status, body) = send(
            &app,
            request(Method::PUT, &uri, Some(1), Some(json!({ "userId": 2 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert!(body["error"].as_str().unwrap().contains("userId"));

        let (status, _) = send(
            &app,
            request(
                Method::PUT,
                &uri,
                Some(1),
                Some(json!({ "status": "submitted" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                &uri,
                Some(1),
                Some(json!({ "hoursWorked": 6, "description": "pairing" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hoursWorked"], 6.0);
        assert_eq!(body["description"], "pairing");
    }

    #[tokio::test]
    async fn submit_week_then_drafts_are_gone() {
        let app = app();
        for day in ["2025-08-04", "2025-08-05", "2025-08-06", "2025-08-07", "2025-08-08"] {
            create_draft(&app, day, "Dev", 8.0).await;
        }

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/submit-week",
                Some(1),
                Some(json!({ "weekStartDate": "2025-08-04" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["submittedCount"], 5);
        assert_eq!(body["totalHours"], 40.0);

        let (_, drafts) = send(
            &app,
            request(Method::GET, "/timesheets/drafts", Some(1), None),
        )
        .await;
        assert_eq!(drafts["count"], 0);
        assert!(app
            .repo
            .all()
            .await
            .iter()
            .all(|t| t.status == TimesheetStatus::Submitted && t.submitted_at.is_some()));
    }

    #[tokio::test]
    async fn submitting_an_empty_week_names_the_range() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/submit-week",
                Some(1),
                Some(json!({ "weekStartDate": "2025-08-11" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["details"]["weekRange"], "Aug 11-17, 2025");
    }

    #[tokio::test]
    async fn week_start_must_be_a_monday() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/submit-week",
                Some(1),
                Some(json!({ "weekStartDate": "2025-08-06" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let app = app();

        let (status, body) = send(
            &app,
            request(Method::GET, "/timesheets/not-a-number", Some(1), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let (status, body) = send(
            &app,
            request(
                Method::GET,
                "/timesheets/existing?projectId=abc&activityType=Dev&date=2025-08-04",
                Some(1),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/bulk-actions",
                Some(1),
                Some(json!({ "timesheetIds": [1], "action": "archive" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn blocked_submission_returns_the_report() {
        let app = app();
        create_draft(&app, "2025-08-04", "Design", 8.0).await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/submit-week",
                Some(1),
                Some(json!({ "weekStartDate": "2025-08-04" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"]["isValid"], false);
        assert!(app
            .repo
            .all()
            .await
            .iter()
            .all(|t| t.status == TimesheetStatus::Draft));
    }

    #[tokio::test]
    async fn bulk_delete_removes_drafts() {
        let app = app();
        let first = create_draft(&app, "2025-08-04", "Dev", 2.0).await;
        let second = create_draft(&app, "2025-08-05", "Dev", 2.0).await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/timesheets/bulk-actions",
                Some(1),
                Some(json!({
                    "timesheetIds": [first["id"], second["id"]],
                    "action": "delete",
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["deletedCount"], 2);
        assert!(app.repo.all().await.is_empty());
    }

    #[tokio::test]
    async fn week_summary_defaults_to_current_week() {
        let app = app();
        create_draft(&app, "2025-08-05", "Review", 3.0).await;

        let (status, body) = send(
            &app,
            request(Method::GET, "/timesheets/week-summary", Some(1), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weekStart"], date!(2025 - 08 - 04).to_string());
        assert_eq!(body["draftCount"], 1);
        assert_eq!(body["canSubmit"], true);
    }

    #[tokio::test]
    async fn lists_project_activities() {
        let app = app();
        let (status, body) = send(
            &app,
            request(Method::GET, "/projects/1/activities", Some(1), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activityTypes"], json!(["Dev", "Review"]));

        let (status, _) = send(
            &app,
            request(Method::GET, "/projects/99/activities", Some(1), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hours_are_checked_on_create() {
        let app = app();
        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/timesheets",
                Some(1),
                Some(json!({
                    "projectId": 1,
                    "activityType": "Dev",
                    "date": "2025-08-04",
                    "hoursWorked": Decimal::new(1, 1).to_string(),
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
