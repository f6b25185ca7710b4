use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use userbase::store::MemoryStore;
use userbase::{api, Server};

struct TestServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(|server| server).await
    }

    async fn spawn_with(configure: impl FnOnce(Server) -> Server) -> Self {
        let server = Server::bind("127.0.0.1:0").await.expect("failed to bind ephemeral port");
        let server = configure(server);
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let router = api::routes(Arc::new(MemoryStore::new()));

        let handle = tokio::spawn(async move {
            server
                .serve_with_shutdown(router, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self { base_url: format!("http://{addr}"), shutdown: Some(tx), handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Idle keep-alive connections hold the drain open, so drop clients first.
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap()
}

#[tokio::test]
async fn crud_over_http() {
    let server = TestServer::spawn().await;
    let client = client();

    let res = client
        .post(server.url("/users/new"))
        .body(r#"{"name":"Ana","age":30,"email":"a@x.com"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "application/json");
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_owned();

    let res = client.get(server.url(&format!("/users/find/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), created);

    let res = client
        .put(server.url(&format!("/users/update/{id}")))
        .body(r#"{"name":"Ana","age":31,"email":"a@x.com"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["age"], 31);

    let res = client.get(server.url("/users")).send().await.unwrap();
    let list: Value = res.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let res = client.delete(server.url(&format!("/users/delete/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&format!("/users/find/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": format!("user {id} not found") }));

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn unknown_routes_are_empty_404s() {
    let server = TestServer::spawn().await;
    let client = client();

    for url in ["/nope", "/users/find/UPPER", "/users/find/a%20b"] {
        let res = client.get(server.url(url)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{url}");
        assert!(res.bytes().await.unwrap().is_empty(), "{url}");
    }

    let res = client.post(server.url("/users")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn bad_payload_does_not_take_the_server_down() {
    let server = TestServer::spawn().await;
    let client = client();

    let res = client.post(server.url("/users/new")).body("{{{").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn oversized_bodies_are_413_and_store_nothing() {
    let server = TestServer::spawn_with(|server| server.max_body_bytes(64)).await;
    let client = client();

    let big = format!(r#"{{"name":"{}","age":1}}"#, "a".repeat(256));
    let res = client.post(server.url("/users/new")).body(big).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "request body too large" }));

    let res = client.post(server.url("/users/new")).body(r#"{"name":"Ana","age":1}"#).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let list: Value = client.get(server.url("/users")).send().await.unwrap().json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    drop(client);
    server.stop().await;
}
