use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the app (same router as prod), but bind to an ephemeral port.
        let app = depot_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read models are fed asynchronously; poll until the condition holds.
async fn eventually<F>(mut check: F) -> bool
where
    F: AsyncFnMut() -> bool,
{
    for _ in 0..40 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}

async fn register_product(client: &reqwest::Client, base_url: &str) -> String {
    let resp = client
        .post(format!("{base_url}/products"))
        .json(&json!({
            "name": "Loratadina 10mg",
            "brand": "Genfar",
            "stock_minimum": 5,
            "sale_price_cents": 1250,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

fn inbound_body(product_id: &str, quantity: i64) -> serde_json::Value {
    json!({
        "product_id": product_id,
        "quantity": quantity,
        "unit_cost_cents": 325,
        "lot_number": "LOTE-2025-001",
        "entry_date": "2025-03-14",
        "recorded_by": Uuid::now_v7().to_string(),
    })
}

fn outbound_body(product_id: &str, quantity: i64, kind: &str) -> serde_json::Value {
    json!({
        "product_id": product_id,
        "quantity": quantity,
        "kind": kind,
        "destination": "Mostrador",
        "exit_date": "2025-03-14",
        "recorded_by": Uuid::now_v7().to_string(),
    })
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_movement_flow_over_http() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let product_id = register_product(&client, base).await;

    // Entrada: 50 units at 3.25 each.
    let resp = client
        .post(format!("{base}/inbound"))
        .json(&inbound_body(&product_id, 50))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(receipt["product"]["stock"], 50);
    assert_eq!(receipt["ledger_entries"][0]["data"]["unit_cost_cents"], 325);
    assert_eq!(receipt["replayed"], false);

    // Salida: 10 units sold; suggested price can be overridden by omission.
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&product_id, 10, "sale"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(receipt["product"]["stock"], 40);

    // The stock-in view eventually lists the product and the entry.
    let seen = eventually(async || {
        let view: serde_json::Value = client
            .get(format!("{base}/inbound"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        view["products"]
            .as_array()
            .is_some_and(|products| products.iter().any(|p| p["id"] == product_id.as_str()))
            && view["entries"].as_array().is_some_and(|e| e.len() == 1)
    })
    .await;
    assert!(seen, "inbound view never caught up");

    // The stock-out view lists the exit with its kind.
    let seen = eventually(async || {
        let view: serde_json::Value = client
            .get(format!("{base}/outbound"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        view["exits"]
            .as_array()
            .is_some_and(|exits| exits.iter().any(|x| x["kind"] == "sale" && x["quantity"] == 10))
    })
    .await;
    assert!(seen, "outbound view never caught up");
}

#[tokio::test]
async fn overdraw_is_rejected_with_available_stock() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let product_id = register_product(&client, base).await;
    client
        .post(format!("{base}/inbound"))
        .json(&inbound_body(&product_id, 10))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&product_id, 11, "sale"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 10);

    // The rejection changed nothing: the full amount still issues cleanly.
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&product_id, 10, "sale"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let receipt: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(receipt["product"]["stock"], 0);
    assert_eq!(receipt["product"]["status"], "out_of_stock");
}

#[tokio::test]
async fn invalid_inputs_map_to_kind_specific_errors() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let product_id = register_product(&client, base).await;
    client
        .post(format!("{base}/inbound"))
        .json(&inbound_body(&product_id, 10))
        .send()
        .await
        .unwrap();

    // Unknown outbound kind.
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&product_id, 1, "invalid_type"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transaction_type");

    // Zero quantity.
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&product_id, 0, "sale"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_quantity");

    // Unknown product.
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&outbound_body(&Uuid::now_v7().to_string(), 1, "sale"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "product_not_found");

    // Malformed date.
    let mut bad_date = outbound_body(&product_id, 1, "sale");
    bad_date["exit_date"] = json!("14/03/2025");
    let resp = client
        .post(format!("{base}/outbound"))
        .json(&bad_date)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_date");
}

#[tokio::test]
async fn idempotency_key_replays_instead_of_reapplying() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let product_id = register_product(&client, base).await;
    client
        .post(format!("{base}/inbound"))
        .json(&inbound_body(&product_id, 10))
        .send()
        .await
        .unwrap();

    let key = Uuid::now_v7().to_string();
    let mut body = outbound_body(&product_id, 4, "sale");
    body["idempotency_key"] = json!(key);

    let first: serde_json::Value = client
        .post(format!("{base}/outbound"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["product"]["stock"], 6);
    assert_eq!(first["replayed"], false);

    // Same key again: original ledger entry comes back, stock untouched.
    let second: serde_json::Value = client
        .post(format!("{base}/outbound"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["replayed"], true);
    assert_eq!(second["product"]["stock"], 6);
    assert_eq!(
        first["ledger_entries"][0]["id"],
        second["ledger_entries"][0]["id"]
    );
}

#[tokio::test]
async fn dashboard_reports_stats_and_alerts() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let product_id = register_product(&client, base).await;
    client
        .post(format!("{base}/inbound"))
        .json(&inbound_body(&product_id, 3))
        .send()
        .await
        .unwrap();

    // Stock 3 with minimum 5: the product must show up as a low-stock alert.
    let ok = eventually(async || {
        let view: serde_json::Value = client
            .get(format!("{base}/dashboard"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        view["stats"]["total_products"] == 1
            && view["stats"]["low_stock"] == 1
            && view["alerts"]
                .as_array()
                .is_some_and(|alerts| alerts.iter().any(|a| a["status"] == "low"))
    })
    .await;
    assert!(ok, "dashboard never caught up");
}
