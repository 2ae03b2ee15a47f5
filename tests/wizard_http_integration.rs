//! Integration tests for the wizard REST surface.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! HTTP contract with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use intake_wizard::error::GatewayError;
use intake_wizard::gateway::SubmissionGateway;
use intake_wizard::store::{Database, LibSqlBackend};
use intake_wizard::wizard::{
    ProjectRecord, StepStore, WizardManager, WizardRouteState, wizard_routes,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub gateway that records inserts instead of calling a backend.
#[derive(Default)]
struct RecordingGateway {
    inserts: Mutex<Vec<ProjectRecord>>,
}

#[async_trait]
impl SubmissionGateway for RecordingGateway {
    fn name(&self) -> &str {
        "recording"
    }

    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), GatewayError> {
        self.inserts.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String, GatewayError> {
        Ok(format!("https://store/{path}"))
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    gateway: Arc<RecordingGateway>,
    db: Arc<dyn Database>,
}

impl TestServer {
    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn action(&self, id: &str, body: Value) -> (u16, Value) {
        self.post(&format!("/api/wizard/sessions/{id}/actions"), body)
            .await
    }

    async fn stored_step(&self, id: &str) -> Option<Value> {
        self.db.get_setting(id, "step").await.unwrap()
    }
}

/// Start an Axum server on a random port.
async fn start_server() -> TestServer {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let gateway = Arc::new(RecordingGateway::default());
    let manager = Arc::new(WizardManager::new(
        StepStore::new(Arc::clone(&db)),
        Arc::clone(&gateway) as Arc<dyn SubmissionGateway>,
        "public",
        "https://home.test",
    ));
    let app = wizard_routes(WizardRouteState { manager });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        gateway,
        db,
    }
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let body: Value = reqwest::get(format!("{}/health", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn full_wizard_run() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, view) = server.post("/api/wizard/sessions", json!({})).await;
        assert_eq!(status, 201);
        assert_eq!(view["step"], "welcome");
        assert_eq!(view["screen"]["primary"]["action"], "begin");
        let id = view["session_id"].as_str().unwrap().to_string();
        assert_eq!(server.stored_step(&id).await, Some(json!("welcome")));

        let (_, view) = server.action(&id, json!({"action": "begin"})).await;
        assert_eq!(view["step"], "name");

        server
            .action(&id, json!({"action": "set_name", "name": "Ada"}))
            .await;
        let (status, view) = server.action(&id, json!({"action": "submit_name"})).await;
        assert_eq!(status, 200);
        assert_eq!(view["step"], "request");
        assert_eq!(view["gateway"]["status"], "sent");
        {
            let inserts = server.gateway.inserts.lock().unwrap();
            assert_eq!(inserts.len(), 1);
            assert_eq!(inserts[0].name, "Ada");
            assert!(inserts[0].request.is_none());
            assert!(inserts[0].files.is_none());
        }

        let (_, view) = server
            .action(
                &id,
                json!({"action": "set_request", "request": "Build me a site"}),
            )
            .await;
        assert_eq!(view["screen"]["primary"]["action"], "submit_request");
        let (_, view) = server
            .action(&id, json!({"action": "submit_request"}))
            .await;
        assert_eq!(view["step"], "files");

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(b"png".to_vec())
                .file_name("x.png")
                .mime_str("image/png")
                .unwrap(),
        );
        let resp = server
            .client
            .post(format!("{}/api/wizard/sessions/{id}/files", server.base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let view: Value = resp.json().await.unwrap();
        assert_eq!(view["form"]["files"], json!(["https://store/public/x.png"]));

        let (_, view) = server.action(&id, json!({"action": "finish"})).await;
        assert_eq!(view["step"], "thanks");
        assert_eq!(view["gateway"]["status"], "sent");
        assert_eq!(view["screen"]["link"]["href"], "https://home.test");

        {
            let inserts = server.gateway.inserts.lock().unwrap();
            assert_eq!(inserts.len(), 2);
            assert_eq!(inserts[1].name, "Ada");
            assert_eq!(inserts[1].request.as_deref(), Some("Build me a site"));
            assert_eq!(
                inserts[1].files.as_deref(),
                Some(&["https://store/public/x.png".to_string()][..])
            );
            assert_eq!(inserts[0].session_id, inserts[1].session_id);
        }
        assert_eq!(server.stored_step(&id).await, None);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn reload_mid_wizard_keeps_step_and_drops_form() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let (_, view) = server.post("/api/wizard/sessions", json!({})).await;
        let id = view["session_id"].as_str().unwrap().to_string();

        server.action(&id, json!({"action": "begin"})).await;
        server
            .action(&id, json!({"action": "set_name", "name": "Ada"}))
            .await;
        server.action(&id, json!({"action": "submit_name"})).await;

        let (status, view) = server
            .post(&format!("/api/wizard/sessions/{id}/load"), json!({}))
            .await;
        assert_eq!(status, 200);
        assert_eq!(view["step"], "request");
        assert_eq!(view["form"]["name"], "");
        assert_eq!(view["form"]["request"], "");
        assert_eq!(view["form"]["files"], json!([]));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn finish_with_empty_file_list_skips_final_write() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let (_, view) = server.post("/api/wizard/sessions", json!({})).await;
        let id = view["session_id"].as_str().unwrap().to_string();

        server.action(&id, json!({"action": "begin"})).await;
        server
            .action(&id, json!({"action": "set_name", "name": "Ada"}))
            .await;
        server.action(&id, json!({"action": "submit_name"})).await;
        server
            .action(&id, json!({"action": "set_request", "request": "A shop"}))
            .await;
        server
            .action(&id, json!({"action": "submit_request"}))
            .await;

        let (_, view) = server.action(&id, json!({"action": "finish"})).await;
        assert_eq!(view["step"], "thanks");
        assert_eq!(view["gateway"]["status"], "skipped");
        assert_eq!(server.gateway.inserts.lock().unwrap().len(), 1);
        assert_eq!(server.stored_step(&id).await, None);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn out_of_order_action_is_conflict() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let (_, view) = server.post("/api/wizard/sessions", json!({})).await;
        let id = view["session_id"].as_str().unwrap().to_string();

        let (status, body) = server.action(&id, json!({"action": "finish"})).await;
        assert_eq!(status, 409);
        assert!(body["error"].as_str().unwrap().contains("finish"));
        assert_eq!(server.stored_step(&id).await, Some(json!("welcome")));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_session_id_is_bad_request() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let (status, body) = server.action("not-a-uuid", json!({"action": "begin"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Invalid session ID");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_session_starts_at_welcome() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = uuid::Uuid::new_v4();
        let body: Value = reqwest::get(format!("{}/api/wizard/sessions/{id}", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["step"], "welcome");
        assert_eq!(server.stored_step(&id.to_string()).await, None);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_without_file_name_is_bad_request() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = uuid::Uuid::new_v4();
        StepStore::new(Arc::clone(&server.db))
            .save(id, intake_wizard::wizard::Step::Files)
            .await
            .unwrap();

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(b"png".to_vec()));
        let resp = server
            .client
            .post(format!("{}/api/wizard/sessions/{id}/files", server.base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let view: Value = reqwest::get(format!("{}/api/wizard/sessions/{id}", server.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["step"], "files");
        assert_eq!(view["form"]["files"], json!([]));
    })
    .await
    .expect("test timed out");
}
