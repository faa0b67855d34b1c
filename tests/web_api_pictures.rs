//! Web API Picture Tests
//!
//! Integration tests for thumbnail and preview-file endpoints.

use std::io::Cursor;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use dailies::directory::InMemoryDirectory;
use dailies::thumbnail::ImageStore;
use dailies::web::handlers::AppState;
use dailies::web::middleware::JwtState;
use dailies::web::router::create_router;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use tempfile::TempDir;
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Test harness: router over a temp content store and an in-memory
/// production directory.
struct TestApp {
    server: TestServer,
    directory: Arc<InMemoryDirectory>,
    state: Arc<AppState>,
    // Keeps the storage root alive for the duration of the test
    _temp: TempDir,
}

fn create_test_app() -> TestApp {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = ImageStore::new(temp.path()).expect("Failed to create store");
    let directory = Arc::new(InMemoryDirectory::new());

    let state = Arc::new(AppState::new(
        directory.clone(),
        store,
        TEST_SECRET,
        10 * 1024 * 1024,
        900,
    ));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));

    let router = create_router(state.clone(), jwt_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        directory,
        state,
        _temp: temp,
    }
}

impl TestApp {
    fn token(&self, person: Uuid) -> String {
        self.state
            .generate_token(person)
            .expect("Failed to generate token")
    }

    fn bearer(&self, person: Uuid) -> String {
        format!("Bearer {}", self.token(person))
    }
}

/// Encode a solid-color PNG of the given dimensions.
fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        w,
        h,
        image::Rgba([180, 90, 45, 255]),
    ));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn picture_form(bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name("picture.png").mime_type("image/png"),
    )
}

// ============================================================================
// Existence and authentication
// ============================================================================

#[tokio::test]
async fn test_unknown_entity_is_404_even_for_managers() {
    let app = create_test_app();
    let manager = Uuid::new_v4();
    app.directory.add_manager(manager);

    let response = app
        .server
        .get(&format!("/shots/{}/thumbnail", Uuid::new_v4()))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .post(&format!("/shots/{}/thumbnail", Uuid::new_v4()))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .multipart(picture_form(png_bytes(10, 10)))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_entity_is_404_not_403_for_outsiders() {
    let app = create_test_app();
    let outsider = Uuid::new_v4();
    app.directory.add_person(outsider);

    // Existence is checked before permission: an outsider probing a random
    // id learns nothing beyond "not found".
    let response = app
        .server
        .get(&format!("/projects/{}/thumbnail", Uuid::new_v4()))
        .add_header(AUTHORIZATION, app.bearer(outsider))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = create_test_app();

    let response = app
        .server
        .get(&format!("/persons/{}/thumbnail", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let app = create_test_app();

    let response = app
        .server
        .get(&format!("/persons/{}/thumbnail", Uuid::new_v4()))
        .add_header(AUTHORIZATION, "Bearer not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Person thumbnails
// ============================================================================

#[tokio::test]
async fn test_person_self_upload_and_square_retrieval() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    app.directory.add_person(person);

    let response = app
        .server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(person))
        .multipart(picture_form(png_bytes(10, 10)))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(
        body["thumbnail_path"],
        format!("/persons/{}/thumbnail", person)
    );

    let response = app
        .server
        .get(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(person))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");

    let img = image::load_from_memory(&response.as_bytes()).unwrap();
    assert_eq!(img.dimensions(), (100, 100));
}

#[tokio::test]
async fn test_person_upload_by_other_non_manager_is_403() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    let other = Uuid::new_v4();
    app.directory.add_person(person);
    app.directory.add_person(other);

    let response = app
        .server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(other))
        .multipart(picture_form(png_bytes(10, 10)))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_person_upload_by_manager_is_allowed() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    let manager = Uuid::new_v4();
    app.directory.add_person(person);
    app.directory.add_manager(manager);

    let response = app
        .server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .multipart(picture_form(png_bytes(64, 64)))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_person_thumbnail_readable_by_any_authenticated_actor() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    let other = Uuid::new_v4();
    app.directory.add_person(person);
    app.directory.add_person(other);

    app.server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(person))
        .multipart(picture_form(png_bytes(20, 20)))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(other))
        .await;
    response.assert_status_ok();
}

// ============================================================================
// Admin-gated entity thumbnails
// ============================================================================

#[tokio::test]
async fn test_project_upload_is_manager_only() {
    let app = create_test_app();
    let project = Uuid::new_v4();
    let member = Uuid::new_v4();
    let manager = Uuid::new_v4();
    app.directory.add_project(project);
    app.directory.add_person(member);
    app.directory.add_project_member(project, member);
    app.directory.add_manager(manager);

    // Even a project member may not upload
    let response = app
        .server
        .post(&format!("/projects/{}/thumbnail", project))
        .add_header(AUTHORIZATION, app.bearer(member))
        .multipart(picture_form(png_bytes(30, 30)))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post(&format!("/projects/{}/thumbnail", project))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .multipart(picture_form(png_bytes(30, 30)))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_shot_retrieval_requires_project_relation() {
    let app = create_test_app();
    let project = Uuid::new_v4();
    let shot = Uuid::new_v4();
    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let manager = Uuid::new_v4();
    app.directory.add_project(project);
    app.directory.add_shot(shot, project);
    app.directory.add_person(member);
    app.directory.add_project_member(project, member);
    app.directory.add_person(outsider);
    app.directory.add_manager(manager);

    app.server
        .post(&format!("/shots/{}/thumbnail", shot))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .multipart(picture_form(png_bytes(320, 240)))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/shots/{}/thumbnail", shot))
        .add_header(AUTHORIZATION, app.bearer(member))
        .await;
    response.assert_status_ok();

    let img = image::load_from_memory(&response.as_bytes()).unwrap();
    assert_eq!(img.dimensions(), (150, 100));

    let response = app
        .server
        .get(&format!("/shots/{}/thumbnail", shot))
        .add_header(AUTHORIZATION, app.bearer(outsider))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_working_file_retrieval_resolves_project_through_task() {
    let app = create_test_app();
    let project = Uuid::new_v4();
    let task = Uuid::new_v4();
    let working_file = Uuid::new_v4();
    let member = Uuid::new_v4();
    let manager = Uuid::new_v4();
    app.directory.add_project(project);
    app.directory.add_task(task, project);
    app.directory.add_working_file(working_file, task);
    app.directory.add_person(member);
    app.directory.add_project_member(project, member);
    app.directory.add_manager(manager);

    app.server
        .post(&format!("/working-files/{}/thumbnail", working_file))
        .add_header(AUTHORIZATION, app.bearer(manager))
        .multipart(picture_form(png_bytes(200, 200)))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/working-files/{}/thumbnail", working_file))
        .add_header(AUTHORIZATION, app.bearer(member))
        .await;
    response.assert_status_ok();
}

// ============================================================================
// Preview files
// ============================================================================

struct PreviewFixture {
    preview: Uuid,
    artist: Uuid,
    member: Uuid,
    outsider: Uuid,
}

/// Project with one task; artist assigned to the task, member only related
/// to the project, outsider unrelated.
fn setup_preview(app: &TestApp) -> PreviewFixture {
    let project = Uuid::new_v4();
    let task = Uuid::new_v4();
    let preview = Uuid::new_v4();
    let artist = Uuid::new_v4();
    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();

    app.directory.add_project(project);
    app.directory.add_task(task, project);
    app.directory.add_preview_file(preview, task);
    app.directory.add_person(artist);
    app.directory.add_project_member(project, artist);
    app.directory.assign_task(task, artist);
    app.directory.add_person(member);
    app.directory.add_project_member(project, member);
    app.directory.add_person(outsider);

    PreviewFixture {
        preview,
        artist,
        member,
        outsider,
    }
}

#[tokio::test]
async fn test_preview_file_original_round_trip() {
    let app = create_test_app();
    let f = setup_preview(&app);
    let uploaded = png_bytes(640, 480);

    let response = app
        .server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(uploaded.clone()))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body, format!("/preview-files/{}/preview", f.preview));

    // Originals are stored without any lossy transform
    let response = app
        .server
        .get(&format!("/preview-files/{}/original", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), uploaded);
}

#[tokio::test]
async fn test_preview_file_variant_completeness() {
    let app = create_test_app();
    let f = setup_preview(&app);

    app.server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(png_bytes(2400, 1350)))
        .await
        .assert_status(StatusCode::CREATED);

    let cases = [
        ("thumbnail", (150, 100)),
        ("thumbnail-square", (100, 100)),
        ("preview", (1200, 675)),
    ];

    for (segment, expected) in cases {
        let response = app
            .server
            .get(&format!("/preview-files/{}/{}", f.preview, segment))
            .add_header(AUTHORIZATION, app.bearer(f.member))
            .await;
        response.assert_status_ok();

        let img = image::load_from_memory(&response.as_bytes()).unwrap();
        assert_eq!(img.dimensions(), expected, "variant {segment}");
    }
}

#[tokio::test]
async fn test_preview_file_upload_requires_task_assignment() {
    let app = create_test_app();
    let f = setup_preview(&app);

    // Related to the project but not assigned to the task
    let response = app
        .server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .multipart(picture_form(png_bytes(50, 50)))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_preview_file_retrieval_requires_project_relation() {
    let app = create_test_app();
    let f = setup_preview(&app);

    app.server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(png_bytes(100, 100)))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/preview-files/{}/thumbnail", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.outsider))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_preview_file_invalid_upload_aborts_variants() {
    let app = create_test_app();
    let f = setup_preview(&app);

    let response = app
        .server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(b"definitely not an image".to_vec()))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // The original is persisted, but no variant was derived
    let response = app
        .server
        .get(&format!("/preview-files/{}/original", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status_ok();

    let response = app
        .server
        .get(&format!("/preview-files/{}/thumbnail", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_file_missing_file_field_is_400() {
    let app = create_test_app();
    let f = setup_preview(&app);

    let response = app
        .server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(MultipartForm::new().add_text("comment", "no file here"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preview_file_reupload_replaces_variants() {
    let app = create_test_app();
    let f = setup_preview(&app);

    app.server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(png_bytes(400, 300)))
        .await
        .assert_status(StatusCode::CREATED);

    let second = png_bytes(800, 600);
    app.server
        .post(&format!("/preview-files/{}/picture", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.artist))
        .multipart(picture_form(second.clone()))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/preview-files/{}/original", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), second);

    let response = app
        .server
        .get(&format!("/preview-files/{}/preview", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status_ok();
    let img = image::load_from_memory(&response.as_bytes()).unwrap();
    assert_eq!(img.dimensions(), (800, 600));
}

#[tokio::test]
async fn test_preview_file_legacy_fallback() {
    let app = create_test_app();
    let f = setup_preview(&app);

    // A picture stored under the pre-variant layout: only the shared legacy
    // folder holds the file.
    let legacy_folder = app.state.store.resolver().folder("preview-files");
    std::fs::create_dir_all(&legacy_folder).unwrap();
    let legacy_bytes = png_bytes(12, 12);
    std::fs::write(app.state.store.resolver().legacy_path(f.preview), &legacy_bytes).unwrap();

    for segment in ["thumbnail", "thumbnail-square", "preview", "original"] {
        let response = app
            .server
            .get(&format!("/preview-files/{}/{}", f.preview, segment))
            .add_header(AUTHORIZATION, app.bearer(f.member))
            .await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().to_vec(), legacy_bytes, "variant {segment}");
    }
}

#[tokio::test]
async fn test_preview_file_retrieval_without_upload_is_404() {
    let app = create_test_app();
    let f = setup_preview(&app);

    let response = app
        .server
        .get(&format!("/preview-files/{}/thumbnail", f.preview))
        .add_header(AUTHORIZATION, app.bearer(f.member))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Idempotence and limits
// ============================================================================

#[tokio::test]
async fn test_reupload_person_thumbnail_keeps_one_file() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    app.directory.add_person(person);

    for size in [10, 40] {
        app.server
            .post(&format!("/persons/{}/thumbnail", person))
            .add_header(AUTHORIZATION, app.bearer(person))
            .multipart(picture_form(png_bytes(size, size)))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let folder = app.state.store.resolver().folder("persons");
    let entries: Vec<_> = std::fs::read_dir(folder).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = ImageStore::new(temp.path()).unwrap();
    let directory = Arc::new(InMemoryDirectory::new());

    // 16 byte limit: any real PNG exceeds it
    let state = Arc::new(AppState::new(
        directory.clone(),
        store,
        TEST_SECRET,
        16,
        900,
    ));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));
    let server = TestServer::new(create_router(state.clone(), jwt_state, &[])).unwrap();

    let person = Uuid::new_v4();
    directory.add_person(person);
    let token = state.generate_token(person).unwrap();

    let response = server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .multipart(picture_form(png_bytes(200, 200)))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_garbage_thumbnail_upload_is_400() {
    let app = create_test_app();
    let person = Uuid::new_v4();
    app.directory.add_person(person);

    let response = app
        .server
        .post(&format!("/persons/{}/thumbnail", person))
        .add_header(AUTHORIZATION, app.bearer(person))
        .multipart(picture_form(b"not an image".to_vec()))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
