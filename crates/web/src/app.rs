use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use storage::BookingEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::features::{classes, members, reservations, waitlist};
use crate::middleware::auth::ApiKeys;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every API route, without the documentation UI.
pub fn router(engine: Arc<BookingEngine>, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health))
        .nest("/api/classes", classes::routes::routes(api_keys.clone()))
        .nest("/api/members", members::routes::routes(api_keys.clone()))
        .nest("/api/reservations", reservations::routes::routes(api_keys.clone()))
        .nest(
            "/api/admin/reservations",
            reservations::routes::admin_routes(api_keys),
        )
        .nest("/api/waitlist", waitlist::routes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use chrono::{Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
    use storage::booking::{Actor, BookingOutcome, NewClass, NewMember};
    use storage::models::ClassType;
    use storage::{BookingPolicy, InMemoryStore, ManualClock};
    use tower::ServiceExt;
    use uuid::Uuid;

    const ADMIN_KEY: &str = "front-desk";

    struct TestApp {
        engine: Arc<BookingEngine>,
        clock: Arc<ManualClock>,
        router: Router,
    }

    async fn app() -> TestApp {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        ));
        let engine = BookingEngine::open(
            Arc::new(InMemoryStore::new()),
            clock.clone(),
            BookingPolicy::default(),
        )
        .await
        .unwrap();
        let engine = Arc::new(engine);
        let router = router(engine.clone(), ApiKeys::from_comma_separated(ADMIN_KEY));

        TestApp {
            engine,
            clock,
            router,
        }
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        admin: bool,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if admin {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn class_body(capacity: i32) -> Value {
        json!({
            "name": "Spinning",
            "class_type": "spinning",
            "date": "2025-06-02",
            "start_time": "18:00:00",
            "end_time": "19:00:00",
            "capacity": capacity,
        })
    }

    async fn member(app: &TestApp, name: &str) -> Uuid {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/members",
            Some(json!({
                "full_name": name,
                "email": format!("{}@gym.test", name.to_lowercase().replace(' ', ".")),
            })),
            true,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["member_id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app.router, Method::GET, "/health", None, false).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_routes_require_api_key() {
        let app = app().await;

        let (status, body) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(10)), false).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, body) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(10)), true).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "activa");
        assert_eq!(body["available_seats"], 10);
    }

    #[tokio::test]
    async fn test_class_validation() {
        let app = app().await;

        let (status, _) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(0)), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut backwards = class_body(10);
        backwards["end_time"] = json!("17:00:00");
        let (status, body) =
            send(&app.router, Method::POST, "/api/classes", Some(backwards), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "End time must be after start time");
    }

    #[tokio::test]
    async fn test_booking_waitlist_and_promotion_over_http() {
        let app = app().await;
        let (_, class) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(1)), true).await;
        let class_id = class["class_id"].as_str().unwrap().to_string();
        let m1 = member(&app, "Ana Torres").await;
        let m2 = member(&app, "Luis Vega").await;

        let (status, booked) = send(
            &app.router,
            Method::POST,
            "/api/reservations",
            Some(json!({ "member_id": m1, "class_id": class_id })),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booked["result"], "confirmed");
        assert_eq!(booked["reservation"]["status"], "confirmada");
        let reservation_id = booked["reservation"]["reservation_id"].as_str().unwrap().to_string();

        let (status, queued) = send(
            &app.router,
            Method::POST,
            "/api/reservations",
            Some(json!({ "member_id": m2, "class_id": class_id })),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(queued["result"], "waitlisted");
        assert_eq!(queued["waitlist_entry"]["position"], 1);

        let (status, cancelled) = send(
            &app.router,
            Method::POST,
            &format!("/api/reservations/{}/cancel", reservation_id),
            Some(json!({ "member_id": m1 })),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["reservation"]["status"], "cancelada");
        assert_eq!(cancelled["promoted"]["member_id"], m2.to_string());
        assert_eq!(cancelled["reserved"], 1);
        assert_eq!(cancelled["waiting"], 0);

        let (status, availability) = send(
            &app.router,
            Method::GET,
            &format!("/api/classes/{}/availability", class_id),
            None,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(availability["available_seats"], 0);
    }

    #[tokio::test]
    async fn test_conflicts_map_to_409() {
        let app = app().await;
        let (_, class) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(3)), true).await;
        let m1 = member(&app, "Ana Torres").await;
        let body = json!({ "member_id": m1, "class_id": class["class_id"] });

        send(&app.router, Method::POST, "/api/reservations", Some(body.clone()), false).await;
        let (status, error) =
            send(&app.router, Method::POST, "/api/reservations", Some(body.clone()), false).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "DUPLICATE_ACTIVE_RESERVATION");

        let (status, error) =
            send(&app.router, Method::POST, "/api/waitlist", Some(body), false).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "DUPLICATE_ACTIVE_RESERVATION");
    }

    #[tokio::test]
    async fn test_unknown_class_is_404() {
        let app = app().await;
        let (status, body) = send(
            &app.router,
            Method::GET,
            &format!("/api/classes/{}/availability", Uuid::new_v4()),
            None,
            false,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_blocked_member_gets_403_with_expiry() {
        let app = app().await;
        let member = app
            .engine
            .register_member(NewMember {
                full_name: "Ana Torres".to_string(),
                email: "ana@gym.test".to_string(),
            })
            .await
            .unwrap();

        let mut reservations = Vec::new();
        for _ in 0..3 {
            let class = app
                .engine
                .register_class(NewClass {
                    name: "Yoga".to_string(),
                    class_type: ClassType::Yoga,
                    instructor_id: None,
                    date: app.engine.now().date_naive(),
                    start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                    capacity: 5,
                    waitlist_enabled: true,
                })
                .await
                .unwrap();
            match app.engine.book(member.member_id, class.class_id).await.unwrap() {
                BookingOutcome::Confirmed(r) => reservations.push(r.reservation_id),
                other => panic!("expected a seat, got {other:?}"),
            }
        }

        app.clock.advance(ChronoDuration::hours(3));
        for (i, reservation_id) in reservations.iter().enumerate() {
            let (status, body) = send(
                &app.router,
                Method::POST,
                &format!("/api/reservations/{}/no-show", reservation_id),
                None,
                true,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["reservation"]["status"], "noshow");
            assert_eq!(body["penalty"]["total_noshow_mes"], i as u64 + 1);
        }

        let (_, class) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(5)), true).await;
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/reservations",
            Some(json!({ "member_id": member.member_id, "class_id": class["class_id"] })),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "MEMBER_BLOCKED");
        assert!(body["blocked_until"].is_string());

        let (status, body) = send(
            &app.router,
            Method::GET,
            &format!("/api/members/{}", member.member_id),
            None,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocked"], true);
        assert_eq!(body["membership_status"], "suspendida");
        assert_eq!(body["total_noshow"], 3);
    }

    #[tokio::test]
    async fn test_member_history_is_paginated_and_filtered() {
        let app = app().await;
        let member_id = member(&app, "Ana Torres").await;
        let mut reservation_ids = Vec::new();
        for _ in 0..3 {
            let (_, class) =
                send(&app.router, Method::POST, "/api/classes", Some(class_body(5)), true).await;
            let class_id: Uuid = class["class_id"].as_str().unwrap().parse().unwrap();
            match app.engine.book(member_id, class_id).await.unwrap() {
                BookingOutcome::Confirmed(r) => reservation_ids.push(r.reservation_id),
                other => panic!("expected a seat, got {other:?}"),
            }
            app.clock.advance(ChronoDuration::minutes(1));
        }
        app.engine
            .cancel_reservation(reservation_ids[0], Actor::Member(member_id))
            .await
            .unwrap();

        let (status, page) = send(
            &app.router,
            Method::GET,
            &format!("/api/members/{}/reservations?page=1&page_size=2", member_id),
            None,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["data"].as_array().unwrap().len(), 2);
        assert_eq!(page["pagination"]["total_items"], 3);
        assert_eq!(page["data"][0]["reservation_id"], reservation_ids[2].to_string());

        let (status, page) = send(
            &app.router,
            Method::GET,
            &format!("/api/members/{}/reservations?status=cancelada", member_id),
            None,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["pagination"]["total_items"], 1);
        assert_eq!(page["data"][0]["reservation_id"], reservation_ids[0].to_string());
    }

    async fn finished_class_with_bookings(app: &TestApp, names: &[&str]) -> String {
        let (_, class) =
            send(&app.router, Method::POST, "/api/classes", Some(class_body(5)), true).await;
        let class_id = class["class_id"].as_str().unwrap().to_string();
        for name in names {
            let member_id = member(app, name).await;
            send(
                &app.router,
                Method::POST,
                "/api/reservations",
                Some(json!({ "member_id": member_id, "class_id": class_id })),
                false,
            )
            .await;
        }
        app.clock.advance(ChronoDuration::hours(11));
        class_id
    }

    #[tokio::test]
    async fn test_bulk_attendance_all_marks_everyone() {
        let app = app().await;
        let class_id = finished_class_with_bookings(&app, &["Ana Torres", "Luis Vega"]).await;

        let (status, report) = send(
            &app.router,
            Method::POST,
            &format!("/api/classes/{}/attendance", class_id),
            Some(json!({ "all": true })),
            true,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["completed"], 2);
        assert_eq!(report["failed"], 0);
    }

    #[tokio::test]
    async fn test_bulk_attendance_rejects_bad_bodies_without_marking_anyone() {
        let app = app().await;
        let class_id =
            finished_class_with_bookings(&app, &["Ana Torres", "Luis Vega", "Marta Ruiz"]).await;
        let uri = format!("/api/classes/{}/attendance", class_id);

        for body in [
            Some(json!({ "reservation_ids": ["not-a-uuid"] })),
            Some(json!({ "reservation_ids": "everyone" })),
            Some(json!({})),
            None,
        ] {
            let (status, error) = send(&app.router, Method::POST, &uri, body, true).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error["code"], "BAD_REQUEST");
        }

        let (_, roster) = send(
            &app.router,
            Method::GET,
            &format!("/api/classes/{}/reservations", class_id),
            None,
            true,
        )
        .await;
        let roster = roster.as_array().unwrap();
        assert_eq!(roster.len(), 3);
        assert!(roster.iter().all(|r| r["status"] == "confirmada"));
    }
}
