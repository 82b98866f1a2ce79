/// Integration tests for listing, detail, delete, dashboard, qualities and progress events
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;
use uuid::Uuid;
use video_core::{ProgressEvent, QualityTier, Role, VideoStatus};

use common::{bearer, status_of, token_for, TestContext};

struct Library {
    admin: Uuid,
    editor: Uuid,
    other_editor: Uuid,
    viewer: Uuid,
    admin_video: Uuid,
    editor_video: Uuid,
    other_video: Uuid,
}

fn seed(ctx: &TestContext) -> Library {
    let dir = &ctx.directory;
    let admin = dir.add_user(Role::Admin);
    let editor = dir.add_user(Role::Editor);
    let other_editor = dir.add_user(Role::Editor);
    let viewer = dir.add_user(Role::Viewer);

    let admin_video = dir.add_video(admin, "Company Keynote", VideoStatus::Safe, "a.mp4", 30);
    let editor_video = dir.add_video(editor, "Cat compilation", VideoStatus::Flagged, "e.mp4", 20);
    let other_video = dir.add_video(other_editor, "Product demo", VideoStatus::Safe, "o.mp4", 10);

    Library {
        admin,
        editor,
        other_editor,
        viewer,
        admin_video,
        editor_video,
        other_video,
    }
}

fn ids(body: &Value) -> Vec<Uuid> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| Uuid::parse_str(v["id"].as_str().unwrap()).unwrap())
        .collect()
}

async fn list<S>(app: &S, user: Uuid, role: Role, query: &str) -> Vec<Uuid>
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/videos{query}"))
        .insert_header(bearer(user, role))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    ids(&body)
}

#[actix_web::test]
async fn test_listing_respects_role_boundary() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    // Newest first
    assert_eq!(
        list(&app, lib.admin, Role::Admin, "").await,
        vec![lib.other_video, lib.editor_video, lib.admin_video]
    );
    assert_eq!(
        list(&app, lib.editor, Role::Editor, "").await,
        vec![lib.editor_video]
    );
    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "").await,
        vec![lib.admin_video]
    );
}

#[actix_web::test]
async fn test_listing_matches_per_asset_decision() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    let all = [lib.admin_video, lib.editor_video, lib.other_video];
    for (user, role) in [
        (lib.admin, Role::Admin),
        (lib.editor, Role::Editor),
        (lib.other_editor, Role::Editor),
        (lib.viewer, Role::Viewer),
    ] {
        let listed = list(&app, user, role, "").await;
        for video in all {
            let req = test::TestRequest::get()
                .uri(&format!("/api/v1/videos/{video}"))
                .insert_header(bearer(user, role))
                .to_request();
            let status = test::call_service(&app, req).await.status();
            assert_eq!(
                listed.contains(&video),
                status == StatusCode::OK,
                "{role:?} {video}"
            );
        }
    }
}

#[actix_web::test]
async fn test_promotion_changes_viewer_visibility_without_touching_videos() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "").await,
        vec![lib.admin_video]
    );

    ctx.directory.set_role(lib.other_editor, Role::Admin);
    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "").await,
        vec![lib.other_video, lib.admin_video]
    );

    ctx.directory.set_role(lib.admin, Role::Editor);
    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "").await,
        vec![lib.other_video]
    );

    // Same state, same answer
    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "").await,
        list(&app, lib.viewer, Role::Viewer, "").await
    );
}

#[actix_web::test]
async fn test_filters_only_narrow() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    assert_eq!(
        list(&app, lib.admin, Role::Admin, "?status=Flagged").await,
        vec![lib.editor_video]
    );
    assert_eq!(
        list(&app, lib.admin, Role::Admin, "?search=DEMO").await,
        vec![lib.other_video]
    );
    // Search cannot reach outside the editor's own uploads
    assert!(list(&app, lib.editor, Role::Editor, "?search=demo")
        .await
        .is_empty());
    // Unknown status is ignored
    assert_eq!(
        list(&app, lib.viewer, Role::Viewer, "?status=Deleted").await,
        vec![lib.admin_video]
    );
}

#[actix_web::test]
async fn test_detail_payload_carries_current_owner_role() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/videos/{}", lib.editor_video))
        .insert_header(bearer(lib.admin, Role::Admin))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

    assert_eq!(body["owner_role"], "Editor");
    assert_eq!(body["status"], "Flagged");
    assert_eq!(body["title"], "Cat compilation");
}

#[actix_web::test]
async fn test_delete_rule_is_owner_or_admin() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;

    // Viewer may watch the admin upload but not delete it
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", lib.admin_video))
        .insert_header(bearer(lib.viewer, Role::Viewer))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", lib.other_video))
        .insert_header(bearer(lib.editor, Role::Editor))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", lib.editor_video))
        .insert_header(bearer(lib.editor, Role::Editor))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );
    assert!(!ctx.directory.contains(lib.editor_video));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", lib.other_video))
        .insert_header(bearer(lib.admin, Role::Admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    // Already gone
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", lib.other_video))
        .insert_header(bearer(lib.admin, Role::Admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_dashboard_counts_only_own_uploads() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    ctx.directory
        .add_video(lib.editor, "Draft", VideoStatus::Processing, "d.mp4", 5);
    ctx.directory
        .add_video(lib.editor, "Tutorial", VideoStatus::Safe, "t.mp4", 5);
    let app = ctx.app().await;

    let stats = |user: Uuid, role: Role| {
        test::TestRequest::get()
            .uri("/api/v1/videos/dashboard/stats")
            .insert_header(bearer(user, role))
            .to_request()
    };

    let resp = test::call_service(&app, stats(lib.editor, Role::Editor)).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        serde_json::json!({"total_videos": 3, "safe_videos": 1, "flagged_videos": 1})
    );

    // Admins see everything in listings but the dashboard is still their own
    let resp = test::call_service(&app, stats(lib.admin, Role::Admin)).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_videos"], 1);

    let resp = test::call_service(&app, stats(lib.viewer, Role::Viewer)).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total_videos"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/videos/dashboard/stats")
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_qualities_lists_original_then_present_renditions() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    ctx.write_rendition(lib.admin_video, QualityTier::Sd480, 10);
    ctx.write_rendition(lib.admin_video, QualityTier::Hd1080, 10);
    let app = ctx.app().await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/videos/{}/qualities", lib.admin_video))
        .insert_header(bearer(lib.viewer, Role::Viewer))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(
        body["available_tiers"],
        serde_json::json!(["original", "1080p", "480p"])
    );
    assert_eq!(body["status"], "Safe");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/videos/{}/qualities", lib.editor_video))
        .insert_header(bearer(lib.viewer, Role::Viewer))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn test_progress_events_reach_the_owner() {
    let ctx = TestContext::new();
    let lib = seed(&ctx);
    let app = ctx.app().await;
    let token = token_for(lib.editor, Role::Editor);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/videos/events?token={token}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(ctx.hub.subscriber_count(lib.editor), 1);

    let delivered = ctx.hub.publish(
        lib.editor,
        ProgressEvent::Completed {
            video_id: lib.editor_video,
            status: VideoStatus::Safe,
        },
    );
    assert_eq!(delivered, 1);
    assert_eq!(
        ctx.hub.publish(
            lib.viewer,
            ProgressEvent::Started {
                video_id: lib.admin_video,
                title: "x".into(),
            }
        ),
        0
    );

    let mut body = Box::pin(resp.into_body());
    let frame = futures::future::poll_fn(|cx| {
        actix_web::body::MessageBody::poll_next(body.as_mut(), cx)
    })
    .await
    .unwrap()
    .unwrap();
    let text = std::str::from_utf8(&frame).unwrap();
    assert!(text.starts_with("data: "));
    assert!(text.contains("\"event\":\"completed\""));
    assert!(text.contains(&lib.editor_video.to_string()));
}

#[actix_web::test]
async fn test_events_require_a_token() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/videos/events")
        .to_request();
    assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_health_and_metrics_are_public() {
    let ctx = TestContext::new();
    let app = ctx.app().await;

    for uri in ["/api/v1/health", "/api/v1/health/live", "/api/v1/health/ready", "/metrics"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK, "{uri}");
    }
}
