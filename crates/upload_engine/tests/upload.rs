use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use upload_engine::{
    dispatch_batch, EngineEvent, EngineHandle, EventSink, FailureKind, ReqwestUploader,
    UploadId, UploadRequest, UploadResponse, UploadSettings, Uploader,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<(UploadId, Instant)>>>,
}

impl TestSink {
    fn settled_order(&self) -> Vec<UploadId> {
        self.events.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        let EngineEvent::UploadCompleted { upload_id, .. } = event;
        self.events.lock().unwrap().push((upload_id, Instant::now()));
    }
}

fn request(server: &MockServer, locator: &str) -> UploadRequest {
    UploadRequest {
        endpoint: format!("{}/upload/", server.uri()),
        locator: locator.to_string(),
        csrf_token: "tok".to_string(),
        collection: None,
    }
}

fn uploader() -> ReqwestUploader {
    ReqwestUploader::new(&UploadSettings::default()).expect("client")
}

#[tokio::test]
async fn posts_form_fields_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .and(body_string_contains("url=http%3A%2F%2Fa%2Fimg.png"))
        .and(body_string_contains("csrfmiddlewaretoken=tok"))
        .and(body_string_contains("collection=7"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": true, "duplicate": false, "form": "<form>", "confirm_duplicate_upload": ""}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(&server, "http://a/img.png");
    req.collection = Some("7".to_string());

    let reply = uploader().upload(1, &req).await.expect("delivered");
    assert_eq!(
        reply,
        UploadResponse {
            success: true,
            duplicate: false,
            confirm_duplicate_upload: String::new(),
            form: "<form>".to_string(),
            error_message: None,
        }
    );
}

#[tokio::test]
async fn collection_is_omitted_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("collection"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"success": false, "error_message": "bad url"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let reply = uploader()
        .upload(1, &request(&server, "http://a"))
        .await
        .expect("delivered");
    assert!(!reply.success);
    assert_eq!(reply.error_message.as_deref(), Some("bad url"));
}

#[tokio::test]
async fn http_error_carries_status_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let failure = uploader()
        .upload(3, &request(&server, "http://a"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::HttpStatus(500));
    assert_eq!(failure.status, Some(500));
    assert_eq!(failure.status_text.as_deref(), Some("Internal Server Error"));
}

#[tokio::test]
async fn non_json_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let failure = uploader()
        .upload(4, &request(&server, "http://a"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::MalformedBody);
    assert_eq!(failure.status, Some(200));
    assert_eq!(failure.status_text.as_deref(), Some("parsererror"));
}

#[tokio::test]
async fn unreachable_endpoint_has_no_status() {
    let req = UploadRequest {
        endpoint: "http://127.0.0.1:9/upload/".to_string(),
        locator: "http://a".to_string(),
        csrf_token: "tok".to_string(),
        collection: None,
    };
    let failure = uploader().upload(5, &req).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Network);
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn dispatch_batch_reports_each_upload_as_it_settles() {
    let server = MockServer::start().await;
    let ok = r#"{"success": true, "duplicate": false, "form": "<form>"}"#;
    Mock::given(method("POST"))
        .and(body_string_contains("slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_raw(ok, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ok, "application/json"))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let requests = vec![
        (1, request(&server, "http://slow-1")),
        (2, request(&server, "http://fast")),
        (3, request(&server, "http://slow-2")),
    ];

    let started = Instant::now();
    dispatch_batch(&uploader(), requests, &sink).await;

    let order = sink.settled_order();
    assert_eq!(order.len(), 3);
    assert_eq!(order[0], 2);
    // Slow uploads ran side by side rather than one after another.
    assert!(started.elapsed() < Duration::from_millis(580));
}

#[test]
fn engine_handle_reports_each_batch_member_on_channel() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"success": true, "duplicate": true, "confirm_duplicate_upload": "<div>"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        server
    });

    let engine = EngineHandle::new(UploadSettings::default()).expect("engine");
    engine.enqueue_batch(vec![
        (11, request(&server, "http://a")),
        (12, request(&server, "http://b")),
    ]);

    let mut settled = Vec::new();
    for _ in 0..2 {
        let event = engine
            .recv_timeout(Duration::from_secs(5))
            .expect("completion event");
        let EngineEvent::UploadCompleted { upload_id, result } = event;
        let reply = result.expect("delivered");
        assert!(reply.duplicate);
        assert_eq!(reply.confirm_duplicate_upload, "<div>");
        settled.push(upload_id);
    }
    settled.sort_unstable();
    assert_eq!(settled, vec![11, 12]);
}
