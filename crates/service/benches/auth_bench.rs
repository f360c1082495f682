use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::domain::LoginInput;
use service::auth::password::{hash_password, PasswordParams};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

fn bench_auth(c: &mut Criterion) {
    let cfg = AuthConfig::default();
    let repo = Arc::new(MockAuthRepository::default());
    repo.seed_student("bench@example.com", "Bench", "Mark", &hash_password(&cfg.password, "Benchmark1").unwrap());
    let svc = AuthService::new(repo, cfg).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
        });
    });

    let session = rt
        .block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() }))
        .unwrap();
    let header = format!("Bearer {}", session.token.token);
    c.bench_function("auth_authenticate_bearer", |b| {
        b.iter(|| {
            rt.block_on(svc.authenticate(&header)).unwrap();
        });
    });
}

fn bench_password_params(c: &mut Criterion) {
    let cheap = PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 };
    c.bench_function("hash_password_cheap", |b| b.iter(|| hash_password(&cheap, "Benchmark1").unwrap()));
}

criterion_group!(benches, bench_auth, bench_password_params);
criterion_main!(benches);
