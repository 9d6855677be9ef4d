use super::*;
use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use shared::protocol::{ClassificationResult, CLASSIFY_FILE_ROUTE, CLASSIFY_ROUTE};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    Classify(serde_json::Value),
    Upload {
        field: String,
        filename: Option<String>,
        contents: String,
    },
}

#[derive(Clone)]
struct ServerState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    body: String,
}

async fn handle_classify(
    State(state): State<ServerState>,
    Json(payload): Json<serde_json::Value>,
) -> (StatusCode, String) {
    state
        .requests
        .lock()
        .expect("lock")
        .push(Recorded::Classify(payload));
    (state.status, state.body.clone())
}

async fn handle_classify_file(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    while let Some(field) = multipart.next_field().await.expect("field") {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let contents = field.text().await.expect("text");
        state.requests.lock().expect("lock").push(Recorded::Upload {
            field: name,
            filename,
            contents,
        });
    }
    (state.status, state.body.clone())
}

struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("lock").clone()
    }
}

async fn spawn_server(status: StatusCode, body: &str) -> MockServer {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        requests: Arc::clone(&requests),
        status,
        body: body.to_string(),
    };
    let app = Router::new()
        .route(CLASSIFY_ROUTE, post(handle_classify))
        .route(CLASSIFY_FILE_ROUTE, post(handle_classify_file))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    MockServer {
        url: format!("http://{addr}"),
        requests,
    }
}

#[derive(Default)]
struct RecordingCelebration {
    calls: Mutex<Vec<CelebrationOptions>>,
}

impl Celebration for RecordingCelebration {
    fn celebrate(&self, options: &CelebrationOptions) {
        self.calls.lock().expect("lock").push(*options);
    }
}

struct Page {
    dom: Arc<HeadlessDom>,
    store: Arc<MemoryPreferenceStore>,
    celebration: Arc<RecordingCelebration>,
    controller: UiController,
}

fn page_with_api(api: Arc<dyn ClassificationApi>) -> Page {
    let dom = Arc::new(HeadlessDom::new());
    let store = Arc::new(MemoryPreferenceStore::new());
    let celebration = Arc::new(RecordingCelebration::default());
    let controller = UiController::new(api, dom.clone(), store.clone())
        .with_celebration(celebration.clone());
    Page {
        dom,
        store,
        celebration,
        controller,
    }
}

fn page(server_url: &str) -> Page {
    page_with_api(Arc::new(
        HttpClassificationApi::new(server_url).expect("api"),
    ))
}

fn csv_file() -> SelectedFile {
    SelectedFile {
        name: "tickets.csv".to_string(),
        contents: b"text\nprinter jammed\n".to_vec(),
    }
}

#[tokio::test]
async fn classify_posts_trimmed_text_once_and_shows_result() {
    let server = spawn_server(
        StatusCode::OK,
        r#"{"category":"Billing","assigned_team":"Finance"}"#,
    )
    .await;
    let page = page(&server.url);
    page.dom
        .set_value(ElementId::TicketText, "  invoice charged twice \n");

    let outcome = page.controller.classify_ticket().await;

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(
        server.requests(),
        vec![Recorded::Classify(
            serde_json::json!({ "text": "invoice charged twice" })
        )]
    );
    assert_eq!(page.dom.text(ElementId::Category).as_deref(), Some("Billing"));
    assert_eq!(page.dom.text(ElementId::Team).as_deref(), Some("Finance"));
    assert!(!page.dom.is_hidden(ElementId::Result));
    assert!(page.dom.is_hidden(ElementId::Loader));
    assert!(page.dom.alerts().is_empty());
    assert_eq!(
        *page.celebration.calls.lock().expect("lock"),
        vec![CelebrationOptions::default()]
    );
}

#[tokio::test]
async fn whitespace_only_text_issues_no_request() {
    let server = spawn_server(StatusCode::OK, "{}").await;
    let page = page(&server.url);
    page.dom.set_value(ElementId::TicketText, " \t\n ");

    assert_eq!(page.controller.classify_ticket().await, ActionOutcome::Skipped);
    assert!(server.requests().is_empty());
    assert!(page.dom.alerts().is_empty());
    assert!(page.dom.is_hidden(ElementId::Loader));
}

#[tokio::test]
async fn error_status_alerts_body_and_keeps_result_hidden() {
    let server = spawn_server(StatusCode::BAD_REQUEST, "bad request").await;
    let page = page(&server.url);
    page.dom.set_value(ElementId::TicketText, "anything");

    let outcome = page.controller.classify_ticket().await;

    assert_eq!(outcome, ActionOutcome::Failed("Error: bad request".to_string()));
    assert_eq!(page.dom.alerts(), vec!["Error: bad request".to_string()]);
    assert!(page.dom.is_hidden(ElementId::Result));
    assert!(page.dom.is_hidden(ElementId::Loader));
    assert!(page.celebration.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn previous_result_is_hidden_when_a_later_request_fails() {
    let ok = spawn_server(
        StatusCode::OK,
        r#"{"category":"software bug","assigned_team":"Software Engineering Team"}"#,
    )
    .await;
    let failing = spawn_server(StatusCode::INTERNAL_SERVER_ERROR, "model offline").await;
    let page = page(&ok.url);
    page.dom.set_value(ElementId::TicketText, "app crashes");
    assert_eq!(page.controller.classify_ticket().await, ActionOutcome::Completed);
    assert!(!page.dom.is_hidden(ElementId::Result));

    let retry = UiController::new(
        Arc::new(HttpClassificationApi::new(&failing.url).expect("api")),
        page.dom.clone(),
        page.store.clone(),
    );
    assert_eq!(
        retry.classify_ticket().await,
        ActionOutcome::Failed("Error: model offline".to_string())
    );
    assert!(page.dom.is_hidden(ElementId::Result));
}

#[tokio::test]
async fn unreachable_server_alerts_with_error_prefix() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let page = page(&format!("http://{addr}"));
    page.dom.set_value(ElementId::TicketText, "monitor flickers");

    let outcome = page.controller.classify_ticket().await;

    let ActionOutcome::Failed(message) = &outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.starts_with("Error: "));
    assert_eq!(page.dom.alerts(), vec![message.clone()]);
    assert!(page.dom.is_hidden(ElementId::Loader));
}

#[tokio::test]
async fn undecodable_success_body_is_reported() {
    let server = spawn_server(StatusCode::OK, "not json").await;
    let page = page(&server.url);
    page.dom.set_value(ElementId::TicketText, "keyboard dead");

    assert!(matches!(
        page.controller.classify_ticket().await,
        ActionOutcome::Failed(message) if message.starts_with("Error: ")
    ));
    assert!(page.dom.is_hidden(ElementId::Result));
}

#[tokio::test]
async fn missing_file_alerts_and_issues_no_request() {
    let server = spawn_server(StatusCode::OK, "[]").await;
    let page = page(&server.url);

    assert_eq!(page.controller.classify_file().await, ActionOutcome::Skipped);
    assert_eq!(page.dom.alerts(), vec![NO_FILE_MESSAGE.to_string()]);
    assert!(server.requests().is_empty());
    assert!(page.dom.is_hidden(ElementId::Loader));
}

#[tokio::test]
async fn bulk_upload_sends_first_file_and_renders_pretty_json() {
    let server = spawn_server(
        StatusCode::OK,
        r#"[{"text":"printer jammed","category":"hardware issue","assigned_team":"Hardware Support Team"}]"#,
    )
    .await;
    let page = page(&server.url);
    let second = SelectedFile {
        name: "other.csv".to_string(),
        contents: b"text\nignored\n".to_vec(),
    };
    page.dom
        .select_files(ElementId::FileInput, vec![csv_file(), second]);

    let outcome = page.controller.classify_file().await;

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(
        server.requests(),
        vec![Recorded::Upload {
            field: "file".to_string(),
            filename: Some("tickets.csv".to_string()),
            contents: "text\nprinter jammed\n".to_string(),
        }]
    );
    assert_eq!(
        page.dom.text(ElementId::FileResult).as_deref(),
        Some(
            "[\n  {\n    \"text\": \"printer jammed\",\n    \"category\": \"hardware issue\",\n    \"assigned_team\": \"Hardware Support Team\"\n  }\n]"
        )
    );
    assert!(!page.dom.is_hidden(ElementId::FileResult));
    assert!(page.dom.is_hidden(ElementId::Loader));
    assert_eq!(page.celebration.calls.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn bulk_failure_alerts_response_body() {
    let server = spawn_server(
        StatusCode::BAD_REQUEST,
        "CSV must contain a 'text' column",
    )
    .await;
    let page = page(&server.url);
    page.dom.select_files(ElementId::FileInput, vec![csv_file()]);

    let outcome = page.controller.classify_file().await;

    assert_eq!(
        outcome,
        ActionOutcome::Failed("Error: CSV must contain a 'text' column".to_string())
    );
    assert!(page.dom.is_hidden(ElementId::FileResult));
    assert!(page.dom.is_hidden(ElementId::Loader));
}

/// Checks the page state at the moment the request is in flight.
struct ProbeApi {
    dom: Arc<HeadlessDom>,
    seen: Mutex<Vec<(bool, bool)>>,
}

#[async_trait]
impl ClassificationApi for ProbeApi {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ApiCallError> {
        self.seen.lock().expect("lock").push((
            self.dom.is_hidden(ElementId::Loader),
            self.dom.is_hidden(ElementId::Result),
        ));
        Err(ApiCallError::Status {
            status: 503,
            body: "busy".to_string(),
        })
    }

    async fn classify_file(
        &self,
        _file: &SelectedFile,
    ) -> Result<serde_json::Value, ApiCallError> {
        self.seen.lock().expect("lock").push((
            self.dom.is_hidden(ElementId::Loader),
            self.dom.is_hidden(ElementId::FileResult),
        ));
        Ok(serde_json::json!({ "rows": 0 }))
    }
}

#[tokio::test]
async fn loader_is_visible_and_panel_hidden_while_request_runs() {
    let dom = Arc::new(HeadlessDom::new());
    dom.set_hidden(ElementId::Result, false);
    dom.set_hidden(ElementId::FileResult, false);
    let api = Arc::new(ProbeApi {
        dom: dom.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let controller = UiController::new(
        api.clone(),
        dom.clone(),
        Arc::new(MemoryPreferenceStore::new()),
    );
    dom.set_value(ElementId::TicketText, "vpn down");
    dom.select_files(ElementId::FileInput, vec![csv_file()]);

    controller.classify_ticket().await;
    assert_eq!(controller.classify_file().await, ActionOutcome::Completed);

    assert_eq!(
        *api.seen.lock().expect("lock"),
        vec![(false, true), (false, true)]
    );
    assert!(dom.is_hidden(ElementId::Loader));
    assert_eq!(
        dom.text(ElementId::FileResult).as_deref(),
        Some("{\n  \"rows\": 0\n}")
    );
}

#[tokio::test]
async fn theme_defaults_to_light_and_toggles_persistently() {
    let page = page("http://127.0.0.1:9");

    assert_eq!(page.controller.init(), Theme::Light);
    assert_eq!(
        page.dom.root_attribute(THEME_ATTRIBUTE).as_deref(),
        Some("light")
    );
    let light_icon = page.dom.text(ElementId::ThemeToggle).expect("icon");

    assert_eq!(page.controller.toggle_theme(), Theme::Dark);
    assert_eq!(page.dom.root_attribute(THEME_ATTRIBUTE).as_deref(), Some("dark"));
    assert_eq!(page.store.get(THEME_STORAGE_KEY).as_deref(), Some("dark"));
    let dark_icon = page.dom.text(ElementId::ThemeToggle).expect("icon");
    assert_ne!(dark_icon, light_icon);

    assert_eq!(page.controller.toggle_theme(), Theme::Light);
    assert_eq!(page.store.get(THEME_STORAGE_KEY).as_deref(), Some("light"));
    assert_eq!(page.dom.text(ElementId::ThemeToggle), Some(light_icon));
}

#[tokio::test]
async fn stored_theme_is_applied_on_reload() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let api: Arc<dyn ClassificationApi> =
        Arc::new(HttpClassificationApi::new("http://127.0.0.1:9").expect("api"));

    let first = UiController::new(api.clone(), Arc::new(HeadlessDom::new()), store.clone());
    first.init();
    first.toggle_theme();

    let dom = Arc::new(HeadlessDom::new());
    let reloaded = UiController::new(api, dom.clone(), store);
    assert_eq!(reloaded.init(), Theme::Dark);
    assert_eq!(reloaded.theme(), Theme::Dark);
    assert_eq!(dom.root_attribute(THEME_ATTRIBUTE).as_deref(), Some("dark"));
    assert_eq!(
        dom.text(ElementId::ThemeToggle).as_deref(),
        Some(Theme::Dark.toggle_icon())
    );
}

#[tokio::test]
async fn unknown_stored_theme_reads_as_light() {
    let page = page("http://127.0.0.1:9");
    page.store
        .set(THEME_STORAGE_KEY, "solarized")
        .expect("set");

    assert_eq!(page.controller.init(), Theme::Light);
    assert_eq!(page.controller.toggle_theme(), Theme::Dark);
}
