use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use chrono::NaiveDate;
use service::auth::domain::{BootstrapInput, LoginInput};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::portfolio::{aggregate, Holding, HoldingSource};

fn bench_login(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let svc = AuthService::new(
        repo,
        AuthConfig { jwt_secret: Some("bench-secret-bench-secret".into()), ..AuthConfig::default() },
    );

    // seed the admin outside of the measured loop
    let rt = tokio::runtime::Runtime::new().unwrap();
    let admin = rt
        .block_on(svc.bootstrap(BootstrapInput {
            tenant_name: "bench".into(),
            email: "bench@example.com".into(),
            name: "Bench".into(),
            password: "Benchmark1".into(),
        }))
        .unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let session = rt
                .block_on(svc.login(LoginInput {
                    tenant_id: admin.tenant_id,
                    email: "bench@example.com".into(),
                    password: "Benchmark1".into(),
                }))
                .unwrap();
            svc.verify_token(session.token.as_deref().unwrap()).unwrap();
        });
    });
}

fn bench_portfolio_aggregate(c: &mut Criterion) {
    let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let holdings: Vec<Holding> = (0..2_000)
        .map(|i| Holding {
            category: format!("category-{}", i % 12),
            subcategory: format!("sub-{}", i % 40),
            asset_name: format!("asset-{i}"),
            closing_balance_cents: 10_000 + i as i64,
            currency: "USD".into(),
            as_of,
            source: HoldingSource::External,
        })
        .collect();
    c.bench_function("portfolio_aggregate_2000", |b| b.iter(|| aggregate(&holdings)));
}

criterion_group!(benches, bench_login, bench_portfolio_aggregate);
criterion_main!(benches);
