//! HTTP host for in-memory onm data stores.
//!
//! Clients create stores from the models registered at startup, enumerate
//! the addresses a store can resolve, and read, create, update, and remove
//! data components by address. Every response is JSON; failures carry an
//! `{ "error", "message" }` body with a status chosen by where the request
//! failed.

pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody, ServerError, ServerResult, Stage};
pub use router::build_router;
pub use server::OnmServer;
pub use state::AppState;


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use onm_model::{ModelDeclaration, NamespaceDeclaration};
    use onm_registry::ModelRegistry;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tower::util::ServiceExt;

    fn models() -> ModelRegistry {
        let mut models = ModelRegistry::new();
        let mut widget = ModelDeclaration::new(
            "Widget",
            NamespaceDeclaration::child("widget")
                .with_property("label", json!("untitled"))
                .with_sub_namespace(NamespaceDeclaration::extension_point(
                    "parts",
                    NamespaceDeclaration::child("part")
                        .with_property("count", json!(0))
                        .with_sub_namespace(NamespaceDeclaration::extension_point(
                            "bolts",
                            NamespaceDeclaration::child("bolt"),
                        )),
                )),
        );
        widget.package = json!({ "name": "widget-model", "version": "1.0.0" });
        models.register_declaration(widget).unwrap();
        models
    }

    fn app_with(config: ServerConfig) -> Router {
        OnmServer::new(config, models()).router()
    }

    fn app() -> Router {
        app_with(ServerConfig::default())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri, None).await
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, Some(body)).await
    }

    async fn delete(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::DELETE, uri, Some(body)).await
    }

    async fn new_store(app: &Router) -> String {
        let (status, body) = post(app, "/create/store", json!({ "model": "Widget" })).await;
        assert_eq!(status, StatusCode::OK);
        body["storeKey"].as_str().unwrap().to_string()
    }

    async fn create(app: &Router, store: &str, address: &str) -> (StatusCode, Value) {
        let body = json!({ "store": store, "address": address });
        post(app, "/create/component", body).await
    }

    async fn update(app: &Router, store: &str, address: &str, data: Value) -> (StatusCode, Value) {
        let body = json!({ "store": store, "address": address, "data": data });
        post(app, "/update/component", body).await
    }

    async fn remove(app: &Router, store: &str, address: &str) -> (StatusCode, Value) {
        let body = json!({ "store": store, "address": address });
        delete(app, "/remove/component", body).await
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn meta_reports_packages() {
        let (status, body) = get(&app(), "/meta").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["onm-server"]["name"], "onm-server");
        assert_eq!(body["onm-model"]["name"], "onm-model");
    }

    #[tokio::test]
    async fn models_lists_registered_models() {
        let (status, body) = get(&app(), "/models").await;
        assert_eq!(status, StatusCode::OK);
        let package = json!({ "name": "widget-model", "version": "1.0.0" });
        assert_eq!(body, json!([{ "modelName": "Widget", "modelPackage": package }]));
    }

    // -----------------------------------------------------------------------
    // Stores
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_store_and_list() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = get(&app, "/stores").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "dataModel": "widget", "storeKey": key }]));
    }

    #[tokio::test]
    async fn create_store_rejects_bad_requests() {
        let app = app();
        let (status, body) = post(&app, "/create/store", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadRequest");

        let (status, _) = send(&app, Method::POST, "/create/store", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(&app, "/create/store", json!({ "model": "Gizmo" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "ModelUnsupported");
    }

    #[tokio::test]
    async fn delete_store_twice() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = delete(&app, "/remove/store", json!({ "store": key })).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = delete(&app, "/remove/store", json!({ "store": key })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");

        let (status, _) = get(&app, &format!("/data/{key}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_answers_only_to_its_issued_key() {
        let app = app();
        let key = new_store(&app).await;
        let upper = key.to_uppercase();
        let simple = key.replace('-', "");
        let urn = format!("urn:uuid:{key}");

        let (status, body) = get(&app, &format!("/addresses/{upper}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");
        let (status, _) = get(&app, &format!("/data/{simple}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = create(&app, &upper, "widget/parts/a").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = delete(&app, "/remove/store", json!({ "store": urn })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(&app, "/stores").await;
        assert_eq!(body, json!([{ "dataModel": "widget", "storeKey": key }]));
        let (status, body) = get(&app, &format!("/addresses/{key}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get(key.as_str()).is_some());
    }

    #[tokio::test]
    async fn bulk_delete_only_when_enabled() {
        let app = app();
        new_store(&app).await;
        let (status, _) = send(&app, Method::DELETE, "/remove/stores", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let app = app_with(ServerConfig {
            enable_bulk_delete: true,
            ..ServerConfig::default()
        });
        new_store(&app).await;
        new_store(&app).await;
        let (status, _) = send(&app, Method::DELETE, "/remove/stores", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = get(&app, "/stores").await;
        assert_eq!(body, json!([]));
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn data_defaults_to_root() {
        let app = app();
        let key = new_store(&app).await;
        let expected = json!({ "widget": { "label": "untitled", "parts": {} } });

        let (status, body) = get(&app, &format!("/data/{key}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);

        let (_, body) = get(&app, &format!("/data?store={key}")).await;
        assert_eq!(body, expected);

        let (_, body) = get(&app, &format!("/data/{key}/widget/parts")).await;
        assert_eq!(body, json!({ "parts": {} }));
    }

    #[tokio::test]
    async fn reads_require_a_known_store() {
        let app = app();
        let (status, body) = get(&app, "/data").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");

        let (status, _) = get(&app, "/addresses/not-a-store").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&app, "/data/nope/bad").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn addresses_of_empty_store() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = get(&app, &format!("/addresses/{key}")).await;
        assert_eq!(status, StatusCode::OK);
        let mut expected = serde_json::Map::new();
        expected.insert(key.clone(), json!(["widget", "widget/parts"]));
        assert_eq!(body, Value::Object(expected));
    }

    #[tokio::test]
    async fn addresses_follow_components() {
        let app = app();
        let key = new_store(&app).await;
        create(&app, &key, "widget/parts/a").await;
        create(&app, &key, "widget/parts/a/bolts/x").await;

        let (_, body) = get(&app, &format!("/addresses/{key}")).await;
        assert_eq!(
            body[key.as_str()],
            json!([
                "widget",
                "widget/parts",
                "widget/parts/a",
                "widget/parts/a/bolts",
                "widget/parts/a/bolts/x"
            ])
        );

        let uri = format!("/addresses?store={key}&address=widget/parts/a/bolts");
        let (_, body) = get(&app, &uri).await;
        assert_eq!(
            body[key.as_str()],
            json!(["widget/parts/a/bolts", "widget/parts/a/bolts/x"])
        );
    }

    #[tokio::test]
    async fn unresolvable_read_is_precondition_failed() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = get(&app, &format!("/data/{key}/widget/parts/missing")).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"], "InvalidAddress");

        let (status, _) = get(&app, &format!("/addresses/{key}/widget/nope")).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_component_returns_record() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = create(&app, &key, "widget/parts/a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "address": "widget/parts/a", "part": { "count": 0, "bolts": {} } })
        );

        let (status, body) = create(&app, &key, "widget/parts/a").await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"], "CreateConflict");
    }

    #[tokio::test]
    async fn create_component_resolves_placeholder() {
        let app = app();
        let key = new_store(&app).await;
        let (status, body) = create(&app, &key, "widget/parts/-").await;
        assert_eq!(status, StatusCode::OK);
        let address = body["address"].as_str().unwrap();
        assert!(address.starts_with("widget/parts/"));
        assert_ne!(address, "widget/parts/-");

        let (status, _) = get(&app, &format!("/data/{key}/{address}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn create_component_failures() {
        let app = app();
        let key = new_store(&app).await;

        let (status, body) = create(&app, "missing", "widget/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");

        let (status, body) = create(&app, &key, "widget/nope").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "InvalidAddress");

        let (status, _) = create(&app, &key, "widget/parts").await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, _) = post(&app, "/create/component", json!({ "store": key })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remove_component_then_read() {
        let app = app();
        let key = new_store(&app).await;
        create(&app, &key, "widget/parts/a").await;
        let (status, _) = get(&app, &format!("/data/{key}/widget/parts/a")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = remove(&app, &key, "widget/parts/a").await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = get(&app, &format!("/data/{key}/widget/parts/a")).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, body) = remove(&app, &key, "widget/parts/a").await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"], "RemoveConflict");

        let (status, _) = remove(&app, &key, "widget").await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn remove_component_failures() {
        let app = app();
        let key = new_store(&app).await;

        let (status, body) = remove(&app, "nope", "bad//x").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");

        let (status, body) = remove(&app, &key, "bad//x").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "InvalidAddress");

        let (status, _) = delete(&app, "/remove/component", json!({ "address": "widget" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::DELETE, "/remove/component", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_round_trip() {
        let app = app();
        let key = new_store(&app).await;
        create(&app, &key, "widget/parts/a").await;

        let (_, before) = get(&app, &format!("/data/{key}/widget/parts/a")).await;
        let mut data = before["part"].clone();
        data["count"] = json!(7);
        let (status, _) = update(&app, &key, "widget/parts/a", data).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, after) = get(&app, &format!("/data/{key}/widget/parts/a")).await;
        assert_eq!(after, json!({ "part": { "count": 7, "bolts": {} } }));
    }

    #[tokio::test]
    async fn update_failures() {
        let app = app();
        let key = new_store(&app).await;

        let (status, body) = update(&app, &key, "widget/parts/zz", json!({ "count": 1 })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownComponent");

        let (status, body) = update(&app, &key, "widget", json!(5)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadPayload");

        let (status, _) = update(&app, &key, "widget/bogus", json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = get(&app, &format!("/data/{key}")).await;
        assert_eq!(body, json!({ "widget": { "label": "untitled", "parts": {} } }));
    }

    #[tokio::test]
    async fn update_checks_store_before_address() {
        let app = app();
        let (status, body) = update(&app, "nope", "bad//x", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");

        let (status, body) = update(&app, "nope", "widget", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "UnknownStore");
    }

    #[tokio::test]
    async fn update_requires_every_field() {
        let app = app();
        let key = new_store(&app).await;
        for body in [
            json!({ "address": "widget", "data": {} }),
            json!({ "store": key, "data": {} }),
            json!({ "store": key, "address": "widget" }),
        ] {
            let (status, reply) = post(&app, "/update/component", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(reply["error"], "BadRequest");
        }
    }

    // -----------------------------------------------------------------------
    // Logging
    // -----------------------------------------------------------------------

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn rejected_requests_are_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = app();
        let (status, _) = post(&app, "/create/component", json!({ "store": "k" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(logs.text().contains("rejected component creation request"));

        let (status, _) = post(&app, "/create/store", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(logs.text().contains("rejected store creation request"));

        let (status, _) = post(&app, "/update/component", json!({ "store": "k" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(logs.text().contains("rejected component update request"));

        let (status, _) = send(&app, Method::DELETE, "/remove/store", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(logs.text().contains("rejected removal request"));
    }

    // -----------------------------------------------------------------------
    // Prefix
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn routes_mount_under_prefix() {
        let app = app_with(ServerConfig {
            route_prefix: "/onm/".into(),
            ..ServerConfig::default()
        });
        let (status, _) = get(&app, "/onm/models").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(&app, "/models").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
