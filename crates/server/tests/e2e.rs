use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::{build_router, AppState};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::AuthConfig;
use service::notify::mock::RecordingNotifier;
use service::portfolio::mock::StaticPortfolioProvider;
use service::storage::MemoryFileStore;
use service::{Backends, Services};

const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    http: reqwest::Client,
    notifier: Arc<RecordingNotifier>,
    admin: String,
    client: String,
    client_id: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn post(&self, token: &str, path: &str, body: Value) -> (HttpStatusCode, Value) {
        let resp = self.http.post(self.url(path)).bearer_auth(token).json(&body).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, token: &str, path: &str) -> (HttpStatusCode, Value) {
        let resp = self.http.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn upload(&self, token: &str, name: &str, bytes: &'static [u8]) -> String {
        let resp = self.http.post(self.url(&format!("/files/{name}"))).bearer_auth(token).body(bytes).send().await.unwrap();
        assert_eq!(resp.status(), HttpStatusCode::CREATED);
        let v: Value = resp.json().await.unwrap();
        v["key"].as_str().unwrap().to_string()
    }
}

async fn login(http: &reqwest::Client, base_url: &str, tenant_id: &str, email: &str) -> Value {
    let resp = http
        .post(format!("{base_url}/auth/login"))
        .json(&json!({"tenant_id": tenant_id, "email": email, "password": "Passw0rd!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), HttpStatusCode::OK);
    resp.json().await.unwrap()
}

async fn start_server(provider: Option<Arc<StaticPortfolioProvider>>) -> anyhow::Result<TestApp> {
    let notifier = Arc::new(RecordingNotifier::default());
    let services = Services::new(
        Backends::in_memory(Arc::new(MockAuthRepository::default())),
        AuthConfig { jwt_secret: Some("e2e-test-secret".into()), ..AuthConfig::default() },
        Arc::new(MemoryFileStore::default()),
        notifier.clone(),
        provider.map(|p| p as Arc<dyn service::portfolio::PortfolioProvider>),
    );
    let app = build_router(AppState::new(services), cors());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    let http = reqwest::Client::new();
    let resp = http
        .post(format!("{base_url}/auth/bootstrap"))
        .json(&json!({"tenant_name": "Acme Capital", "email": "admin@acme.io", "name": "Ada Admin", "password": "Passw0rd!"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);
    let admin_user: Value = resp.json().await?;
    let tenant_id = admin_user["tenant_id"].as_str().unwrap().to_string();
    let admin = login(&http, &base_url, &tenant_id, "admin@acme.io").await["token"].as_str().unwrap().to_string();

    let resp = http
        .post(format!("{base_url}/users"))
        .bearer_auth(&admin)
        .json(&json!({"email": "carl@client.io", "name": "Carl Client", "password": "Passw0rd!"}))
        .send()
        .await?;
    assert_eq!(resp.status(), HttpStatusCode::CREATED);
    let session = login(&http, &base_url, &tenant_id, "carl@client.io").await;

    Ok(TestApp {
        base_url,
        http,
        notifier,
        admin,
        client: session["token"].as_str().unwrap().to_string(),
        client_id: session["user_id"].as_str().unwrap().to_string(),
    })
}

async fn open_product(app: &TestApp) -> Value {
    let (status, product) = app
        .post(
            &app.admin,
            "/products",
            json!({
                "name": "Growth Fund I",
                "category": "private_equity",
                "currency": "usd",
                "min_investment_cents": 10_000_000,
                "fee_schedule": {"management_fee_bps": 200, "performance_fee_bps": 2000}
            }),
        )
        .await;
    assert_eq!(status, HttpStatusCode::CREATED, "{product}");
    assert_eq!(product["status"], "draft");
    let id = product["id"].as_str().unwrap();
    let (status, product) = app.post(&app.admin, &format!("/products/{id}/status"), json!({"status": "open"})).await;
    assert_eq!(status, HttpStatusCode::OK);
    product
}

#[tokio::test]
async fn investment_lifecycle_end_to_end() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let product = open_product(&app).await;
    let product_id = product["id"].as_str().unwrap();
    assert!(product["code"].as_str().unwrap().starts_with("PE"));
    assert_eq!(product["currency"], "USD");

    // below minimum
    let (status, body) = app
        .post(&app.client, "/commitments", json!({"product_id": product_id, "amount_cents": 5_000_000}))
        .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    let (status, commitment) = app
        .post(&app.client, "/commitments", json!({"product_id": product_id, "amount_cents": 25_000_000, "note": "first close"}))
        .await;
    assert_eq!(status, HttpStatusCode::CREATED);
    let commitment_id = commitment["id"].as_str().unwrap();
    assert_eq!(app.notifier.emails_to("admin@acme.io").len(), 1);

    // clients cannot accept
    let (status, _) = app.post(&app.client, &format!("/commitments/{commitment_id}/accept"), json!({})).await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);
    let (status, accepted) = app.post(&app.admin, &format!("/commitments/{commitment_id}/accept"), json!({})).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, sub) = app.post(&app.admin, "/subscriptions", json!({"commitment_id": commitment_id})).await;
    assert_eq!(status, HttpStatusCode::CREATED);
    let sub_id = sub["id"].as_str().unwrap();
    let (status, _) = app.post(&app.admin, "/subscriptions", json!({"commitment_id": commitment_id})).await;
    assert_eq!(status, HttpStatusCode::CONFLICT);

    let (status, _) = app
        .post(&app.client, &format!("/subscriptions/{sub_id}/sign"), json!({"signature_data_url": "data:text/plain;base64,aGk="}))
        .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    let (status, signed) = app
        .post(&app.client, &format!("/subscriptions/{sub_id}/sign"), json!({"signature_data_url": SIGNATURE}))
        .await;
    assert_eq!(status, HttpStatusCode::OK, "{signed}");
    assert_eq!(signed["status"], "signed");
    assert_eq!(signed["document_sha256"].as_str().unwrap().len(), 64);

    let agreement_key = signed["document_key"].as_str().unwrap();
    let resp = app.http.get(app.url(&format!("/files/{agreement_key}"))).bearer_auth(&app.client).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    assert!(resp.text().await?.contains("Subscription Agreement"));

    let bank = json!({"bank_name": "First Bank", "account_name": "Growth Fund I LP", "account_number": "0012345", "swift": "fbnkus33", "reference": "GF1-CALL-1"});
    let (status, _) = app
        .post(&app.admin, "/capital-calls", json!({"subscription_id": sub_id, "amount_cents": 30_000_000, "due_date": "2024-06-30", "bank_details": bank}))
        .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    let (status, call) = app
        .post(&app.admin, "/capital-calls", json!({"subscription_id": sub_id, "amount_cents": 10_000_000, "due_date": "2024-06-30", "bank_details": bank}))
        .await;
    assert_eq!(status, HttpStatusCode::CREATED, "{call}");
    assert_eq!(call["bank_details"]["swift"], "FBNKUS33");
    let call_id = call["id"].as_str().unwrap();

    let (status, receipt) = app.post(&app.admin, &format!("/capital-calls/{call_id}/receipt"), json!({"received_on": "2024-06-28"})).await;
    assert_eq!(status, HttpStatusCode::CREATED, "{receipt}");
    assert_eq!(receipt["source"], "generated");
    assert_eq!(receipt["amount_cents"], 10_000_000);

    let (_, call) = app.get(&app.client, &format!("/capital-calls/{call_id}")).await;
    assert_eq!(call["status"], "paid");
    let (status, _) = app.post(&app.admin, &format!("/capital-calls/{call_id}/receipt"), json!({})).await;
    assert_eq!(status, HttpStatusCode::CONFLICT);

    let (status, receipts) = app.get(&app.client, "/receipts").await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(receipts["total"], 1);

    let (status, summary) = app.get(&app.admin, &format!("/commitments/summary?product_id={product_id}")).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(summary["by_product"][0]["status"], "subscribed");
    assert_eq!(summary["by_product"][0]["total_cents"], 25_000_000);

    // product with commitments cannot be deleted
    let resp = app.http.delete(app.url(&format!("/products/{product_id}"))).bearer_auth(&app.admin).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn statements_are_listed_newest_period_first() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let key = app.upload(&app.admin, "statement.pdf", b"%PDF-1.4 statement").await;

    for (month, year) in [("March", 2024), ("december", 2023), ("JAN", 2024)] {
        let (status, body) = app
            .post(
                &app.admin,
                "/statements",
                json!({"client_id": app.client_id, "title": format!("{month} {year}"), "month": month, "year": year, "file_key": key}),
            )
            .await;
        assert_eq!(status, HttpStatusCode::CREATED, "{body}");
    }
    let (status, _) = app
        .post(&app.admin, "/statements", json!({"client_id": app.client_id, "title": "x", "month": "Smarch", "year": 2024, "file_key": key}))
        .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);

    let (status, list) = app.get(&app.client, "/statements").await;
    assert_eq!(status, HttpStatusCode::OK);
    let periods: Vec<(String, i64)> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["month"].as_str().unwrap().to_string(), s["year"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        periods,
        vec![("March".to_string(), 2024), ("January".to_string(), 2024), ("December".to_string(), 2023)]
    );

    let (_, timeline) = app.get(&app.client, "/statements/timeline").await;
    assert_eq!(timeline[0]["year"], 2024);
    assert_eq!(timeline[0]["statements"][0]["month"], "January");
    assert_eq!(timeline[1]["year"], 2023);
    assert_eq!(app.notifier.pushes.lock().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn kyc_review_and_file_scoping() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let key = app.upload(&app.client, "passport.png", b"\x89PNG fake").await;

    let (status, doc) = app.post(&app.client, "/kyc", json!({"doc_type": "Passport", "file_key": key})).await;
    assert_eq!(status, HttpStatusCode::CREATED, "{doc}");
    assert_eq!(doc["doc_type"], "passport");
    let id = doc["id"].as_str().unwrap();

    let (status, _) = app.post(&app.admin, &format!("/kyc/{id}/review"), json!({"decision": "rejected"})).await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    let (status, reviewed) = app
        .post(&app.admin, &format!("/kyc/{id}/review"), json!({"decision": "approved", "note": "looks good"}))
        .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(reviewed["status"], "approved");

    let foreign = format!("{}/{}-x.pdf", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
    let resp = app.http.get(app.url(&format!("/files/{foreign}"))).bearer_auth(&app.client).send().await?;
    assert_eq!(resp.status(), HttpStatusCode::NOT_FOUND);
    let resp = app.http.get(app.url("/files/..%2F..%2Fetc%2Fpasswd")).bearer_auth(&app.client).send().await?;
    assert!(resp.status().is_client_error());
    Ok(())
}

#[tokio::test]
async fn portfolio_falls_back_to_manual_assets_when_provider_down() -> anyhow::Result<()> {
    let app = start_server(Some(Arc::new(StaticPortfolioProvider::unavailable()))).await?;

    let asset = json!({
        "client_id": app.client_id,
        "category": "Real Estate",
        "subcategory": "Residential",
        "asset_name": "Lisbon flat",
        "closing_balance_cents": 42_000_000,
        "currency": "EUR",
        "as_of": "2024-03-31"
    });
    let (status, _) = app.post(&app.client, "/assets", asset.clone()).await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);
    let (status, _) = app.post(&app.admin, "/assets", asset).await;
    assert_eq!(status, HttpStatusCode::CREATED);

    let (status, view) = app.get(&app.client, &format!("/portfolio/{}", app.client_id)).await;
    assert_eq!(status, HttpStatusCode::OK, "{view}");
    assert_eq!(view["external_available"], false);
    assert_eq!(view["total_cents"], 42_000_000);
    assert_eq!(view["categories"][0]["category"], "Real Estate");
    assert_eq!(view["categories"][0]["share_bps"], 10_000);

    let (status, _) = app.get(&app.client, &format!("/portfolio/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn newsletters_hidden_from_clients_until_published() -> anyhow::Result<()> {
    let app = start_server(None).await?;
    let (status, n) = app.post(&app.admin, "/newsletters", json!({"title": "Q1 letter", "summary": "Markets"})).await;
    assert_eq!(status, HttpStatusCode::CREATED);
    let id = n["id"].as_str().unwrap();

    let (_, list) = app.get(&app.client, "/newsletters").await;
    assert_eq!(list.as_array().unwrap().len(), 0);
    let (status, _) = app.get(&app.client, &format!("/newsletters/{id}")).await;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);

    let (status, published) = app.post(&app.admin, &format!("/newsletters/{id}/publish"), json!({})).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(published["published"], true);
    let (status, _) = app.post(&app.admin, &format!("/newsletters/{id}/publish"), json!({})).await;
    assert_eq!(status, HttpStatusCode::CONFLICT);

    let (_, list) = app.get(&app.client, "/newsletters").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    Ok(())
}
