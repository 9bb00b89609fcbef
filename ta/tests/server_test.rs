//! HTTP and WebSocket tests against a live server on an ephemeral port

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use taskagent::config::PlanningConfig;
use taskagent::events::ListenerHub;
use taskagent::llm::ScriptedLlmClient;
use taskagent::planning::Decomposer;
use taskagent::prompts::PromptLoader;
use taskagent::server::{AppState, router};
use taskagent::service::TaskService;
use taskagent::state::StateManager;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as ClientMessage;

const PLAN: &str = "Step 1: Quick survey of options\nStep 2: Search for prices online";

struct TestServer {
    addr: SocketAddr,
    hub: Arc<ListenerHub>,
    client: reqwest::Client,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let hub = Arc::new(ListenerHub::new());
        let prompts = Arc::new(PromptLoader::embedded_only());
        let state = StateManager::spawn(temp_dir.path(), prompts.clone()).expect("Failed to spawn state manager");
        let decomposer = Decomposer::new(
            Arc::new(ScriptedLlmClient::replying(PLAN)),
            prompts.clone(),
            PlanningConfig::default(),
        );
        let service = Arc::new(TaskService::new(state, decomposer, prompts, hub.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral listener");
        let addr = listener.local_addr().expect("resolve listener addr");
        let app = router(AppState {
            service,
            hub: hub.clone(),
        });
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            hub,
            client: reqwest::Client::new(),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.expect("GET failed");
        read(response).await
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("POST failed");
        read(response).await
    }

    async fn patch(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .patch(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("PATCH failed");
        read(response).await
    }

    async fn wait_for_listeners(&self, count: usize) {
        for _ in 0..100 {
            if self.hub.listener_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} listeners, have {}", count, self.hub.listener_count());
    }
}

async fn read(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_task_lifecycle_over_http() {
    let server = TestServer::start().await;

    let (status, task) = server.post("/api/v1/tasks/", json!({"title": "Buy a bike"})).await;
    assert_eq!(status, 201);
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["title"], "Buy a bike");
    assert_eq!(task["estimated_minutes"], 15 + 30);
    let steps = task["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1]["tool"], "search tool");

    let (status, listed) = server.get("/api/v1/tasks/").await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // bare hex ids are accepted
    let (status, fetched) = server.get(&format!("/api/v1/tasks/{}", task_id.replace('-', ""))).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["id"], task_id.as_str());

    let (status, renamed) = server
        .patch(&format!("/api/v1/tasks/{}", task_id), json!({"title": "Buy a road bike"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(renamed["title"], "Buy a road bike");

    let step_id = steps[0]["id"].as_str().unwrap();
    let (status, step) = server
        .patch(&format!("/api/v1/tasks/steps/{}", step_id), json!({"done": true}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(step["done"], true);

    let (status, completed) = server
        .post(&format!("/api/v1/tasks/{}/complete", task_id), json!({}))
        .await;
    assert_eq!(status, 200);
    let summary = completed["summary_markdown"].as_str().unwrap();
    assert!(summary.contains("Buy a road bike"));

    let (status, today) = server.get("/api/v1/summary/today").await;
    assert_eq!(status, 200);
    assert!(today["summary_markdown"].as_str().unwrap().contains("Buy a road bike"));

    let (status, achievements) = server.get("/api/v1/achievements/?page=1&limit=10").await;
    assert_eq!(status, 200);
    let achievements = achievements.as_array().unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0]["task_count"], 1);
    assert_eq!(achievements[0]["step_count"], 1);

    let achievement_id = achievements[0]["id"].as_str().unwrap();
    let (status, one) = server.get(&format!("/api/v1/achievements/{}", achievement_id)).await;
    assert_eq!(status, 200);
    assert_eq!(one["date_key"], achievements[0]["date_key"]);
}

#[tokio::test]
async fn test_not_found_and_bad_input() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/api/v1/tasks/not-a-uuid").await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let missing = "0190a6b2-7c1e-7000-8000-000000000000";
    let (status, _) = server.post(&format!("/api/v1/tasks/{}/complete", missing), json!({})).await;
    assert_eq!(status, 404);
    let (status, _) = server
        .patch(&format!("/api/v1/tasks/steps/{}", missing), json!({"done": true}))
        .await;
    assert_eq!(status, 404);
    let (status, _) = server.get(&format!("/api/v1/achievements/{}", missing)).await;
    assert_eq!(status, 404);

    let (status, body) = server.get("/api/v1/summary/2024-13-01").await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    // chrono alone would accept these as 2024-03-09
    for padded in ["2024-03-%209", "%202024-3-09", "2024-%203-09"] {
        let (status, _) = server.get(&format!("/api/v1/summary/{}", padded)).await;
        assert_eq!(status, 400, "{} should be rejected", padded);
    }

    let (status, body) = server.get("/api/v1/summary/2020-01-01").await;
    assert_eq!(status, 200);
    assert!(body["summary_markdown"].as_str().unwrap().contains("No tasks completed yet today."));

    let (status, _) = server.post("/api/v1/tasks/", json!({"title": "   "})).await;
    assert_eq!(status, 400);

    let (status, _) = server.get("/api/v1/achievements/?limit=500").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_progress_websocket_receives_events() {
    let server = TestServer::start().await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/progress", server.addr))
        .await
        .expect("failed to establish websocket connection");
    server.wait_for_listeners(1).await;

    let (_, task) = server.post("/api/v1/tasks/", json!({"title": "Fix the fence"})).await;
    let step_id = task["steps"][0]["id"].as_str().unwrap().to_string();
    server
        .patch(&format!("/api/v1/tasks/steps/{}", step_id), json!({"done": true}))
        .await;

    let event = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match socket.next().await {
                Some(Ok(ClientMessage::Text(text))) => {
                    return serde_json::from_str::<Value>(text.as_str()).expect("event should be json");
                }
                Some(Ok(_)) => continue,
                other => panic!("websocket closed before event: {:?}", other),
            }
        }
    })
    .await
    .expect("event should arrive before timeout");

    assert_eq!(event["type"], "step_update");
    assert_eq!(event["step_id"], step_id.as_str());
    assert_eq!(event["task_id"], task["id"]);
    assert_eq!(event["done"], true);

    socket.close(None).await.expect("close websocket");
    server.wait_for_listeners(0).await;
}
