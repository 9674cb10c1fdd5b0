use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use transport_queue::{memory::MemoryDatabase, server::Server};
use web::{router, WebState};

struct App {
    base: String,
    http: reqwest::Client,
}

impl App {
    async fn spawn() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = Server::new(MemoryDatabase::new());
        let state = WebState::new(server.client("test"), Duration::from_millis(50));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state).into_make_service())
                .await
                .unwrap();
        });
        Self {
            base: format!("http://{}/api", address),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    /// Registers a coordinator profile and a station and returns the station id.
    async fn station_of(&self, coordinator: &str) -> String {
        let response = as_user(self.post("/v1/coordinators"), coordinator, "coordinator")
            .json(&json!({ "experience": 3 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = as_user(self.post("/v1/stations"), coordinator, "coordinator")
            .json(&json!({
                "name": "Gaborone Bus Rank",
                "address": "Old Lobatse Road",
                "city": "Gaborone",
                "capacity": 10,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_owned()
    }
}

fn as_user(request: RequestBuilder, user: &str, role: &str) -> RequestBuilder {
    request.header("x-user-id", user).header("x-user-role", role)
}

fn vehicle(number: &str) -> Value {
    json!({
        "operatorName": "Kagiso",
        "vehicleNumber": number,
        "route": "Gaborone - Tlokweng",
        "destination": "Tlokweng",
        "capacity": 15,
        "serviceType": "combi",
        "status": "waiting",
        "position": 99,
    })
}

async fn body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn ping_answers() {
    let app = App::spawn().await;
    let response = app.get("/ping").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await, json!({ "message": "pong!" }));
}

#[tokio::test]
async fn unknown_routes_get_an_error_envelope() {
    let app = App::spawn().await;
    let response = app.get("/v1/nowhere").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["httpMethod"], json!("GET"));
    assert_eq!(body["requestedUri"], json!("/api/v1/nowhere"));
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = App::spawn().await;
    let response = app.get("/v1/driver/queue-status").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(response).await["success"], json!(false));

    let response = app
        .post("/v1/stations")
        .json(&json!({ "name": "Rank", "capacity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get("/v1/driver/queue-status")
        .header("x-user-id", "alice")
        .header("x-user-role", "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/v1/stations").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"], json!([]));
}

#[tokio::test]
async fn coordinator_runs_a_queue() {
    let app = App::spawn().await;
    let station = app.station_of("coordinator-1").await;
    let queue = format!("/v1/coordinator/queue/{}", station);

    let response = as_user(app.post("/v1/driver/join-queue"), "alice", "driver")
        .json(&json!({
            "stationId": station,
            "vehicleNumber": "b 123 abc",
            "route": "Gaborone - Tlokweng",
            "destination": "Tlokweng",
            "capacity": 15,
            "serviceType": "combi",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let joined = body(response).await;
    assert_eq!(joined["data"]["vehicleNumber"], json!("B123ABC"));
    assert_eq!(joined["data"]["position"], json!(1));
    let alice_entry = joined["data"]["id"].as_str().unwrap().to_owned();

    let response = as_user(app.post(&format!("{}/add", queue)), "coordinator-1", "coordinator")
        .json(&vehicle("B456DEF"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let added = body(response).await;
    assert_eq!(added["data"]["position"], json!(2));
    let walk_up = added["data"]["id"].as_str().unwrap().to_owned();

    let response = as_user(app.put(&format!("{}/move", queue)), "coordinator-1", "coordinator")
        .json(&json!({ "vehicleId": walk_up, "direction": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let waiting = body(response).await["data"].clone();
    assert_eq!(waiting[0]["vehicleNumber"], json!("B456DEF"));
    assert_eq!(waiting[1]["vehicleNumber"], json!("B123ABC"));

    let response = as_user(app.put(&format!("{}/move", queue)), "coordinator-1", "coordinator")
        .json(&json!({ "vehicleId": walk_up, "direction": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = as_user(app.put(&format!("{}/update", queue)), "coordinator-1", "coordinator")
        .json(&json!({
            "vehicleId": alice_entry,
            "status": "loading",
            "timestamp": "2024-06-01T08:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["status"], json!("loading"));

    let response = as_user(app.get("/v1/driver/queue-status"), "alice", "driver")
        .send()
        .await
        .unwrap();
    let status = body(response).await["data"].clone();
    assert_eq!(status[0]["stationName"], json!("Gaborone Bus Rank"));
    assert_eq!(status[0]["entry"]["status"], json!("loading"));

    let response = as_user(app.get("/v1/driver/notifications"), "alice", "driver")
        .send()
        .await
        .unwrap();
    let notifications = body(response).await["data"].clone();
    assert!(notifications
        .as_array()
        .unwrap()
        .iter()
        .any(|notification| notification["kind"] == json!("loadingStarted")));

    let response = as_user(app.put(&format!("{}/update", queue)), "coordinator-1", "coordinator")
        .json(&json!({ "vehicleId": walk_up, "status": "knocked_off" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = as_user(app.put(&format!("{}/update", queue)), "coordinator-1", "coordinator")
        .json(&json!({
            "vehicleId": walk_up,
            "status": "knocked_off",
            "extra": { "reason": "no licence disc" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(response).await["data"]["knockOffReason"],
        json!("no licence disc")
    );

    let response = as_user(app.get(&queue), "coordinator-1", "coordinator")
        .send()
        .await
        .unwrap();
    let entries = body(response).await["data"].clone();
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(entries[0]["status"], json!("loading"));
    assert_eq!(entries[1]["status"], json!("knocked_off"));

    let response = as_user(app.get(&format!("{}/stats", queue)), "coordinator-1", "coordinator")
        .send()
        .await
        .unwrap();
    assert_eq!(body(response).await["data"]["knockOffs"], json!(1));
}

#[tokio::test]
async fn queue_conflicts_are_reported() {
    let app = App::spawn().await;
    let station = app.station_of("coordinator-1").await;
    let join = json!({
        "stationId": station,
        "vehicleNumber": "B123ABC",
        "capacity": 15,
        "serviceType": "taxi",
    });

    let response = as_user(app.post("/v1/driver/join-queue"), "alice", "driver")
        .json(&join)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = as_user(app.post("/v1/driver/join-queue"), "bob", "driver")
        .json(&join)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let message = body(response).await["message"].clone();
    assert!(message.as_str().unwrap().contains("B123ABC"));

    let response = as_user(
        app.post(&format!("/v1/stations/{}/deactivate", station)),
        "coordinator-1",
        "coordinator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = as_user(app.post("/v1/driver/leave-queue"), "alice", "driver")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["success"], json!(true));

    let response = as_user(app.post("/v1/driver/leave-queue"), "alice", "driver")
        .json(&json!({ "stationId": station }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_coordinators_are_forbidden() {
    let app = App::spawn().await;
    let station = app.station_of("coordinator-1").await;
    app.station_of("coordinator-2").await;

    let response = as_user(
        app.get(&format!("/v1/coordinator/queue/{}", station)),
        "coordinator-2",
        "coordinator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = as_user(
        app.get("/v1/coordinator/queue/does-not-exist"),
        "coordinator-1",
        "coordinator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schemas_are_served() {
    let app = App::spawn().await;
    let response = app
        .get("/v1/stations/schema?exampleData=true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(response).await["examples"][0]["name"],
        json!("Gaborone Bus Rank")
    );

    let response = as_user(
        app.get("/v1/coordinator/queue/schema"),
        "coordinator-1",
        "coordinator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn event_stream_pushes_snapshots() {
    let app = App::spawn().await;
    let station = app.station_of("coordinator-1").await;

    let mut response = as_user(
        app.get(&format!("/v1/coordinator/queue/{}/events", station)),
        "coordinator-1",
        "coordinator",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: snapshot"));
}
