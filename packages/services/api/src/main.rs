//! GenoVault API
//!
//! 유전체 메타데이터 레코드(사용자, 유전체, 샘플, 시퀀스/변이 파일)를 제공하는 HTTP 서비스입니다.
//! `/api/login`을 제외한 모든 `/api` 라우트는 Bearer 토큰 게이트 뒤에 있습니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gv_core::records::{Genome, Sample, SequenceFile, User, VariantFile};

mod config;
mod error;
mod handlers;
mod middleware;
mod state;
mod store;


use config::Config;
use handlers::{records, users};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gv_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting GenoVault API with config: {:?}", config);

    // 앱 상태 초기화
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("GenoVault API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// 라우터 생성
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    // 토큰 게이트 뒤의 라우트
    let protected = Router::new()
        .route("/users", get(records::list::<User>).post(users::create_user))
        .route(
            "/users/{id}",
            get(records::get_one::<User>)
                .put(users::update_user)
                .delete(records::delete::<User>),
        )
        .route(
            "/genomes",
            get(records::list::<Genome>).post(records::create::<Genome>),
        )
        .route(
            "/genomes/{id}",
            get(records::get_one::<Genome>)
                .put(records::update::<Genome>)
                .delete(records::delete::<Genome>),
        )
        .route(
            "/samples",
            get(records::list::<Sample>).post(records::create::<Sample>),
        )
        .route(
            "/samples/{id}",
            get(records::get_one::<Sample>)
                .put(records::update::<Sample>)
                .delete(records::delete::<Sample>),
        )
        .route("/samples/{id}/variants", get(records::list_sample_variants))
        .route(
            "/sequence",
            get(records::list::<SequenceFile>).post(records::create::<SequenceFile>),
        )
        .route(
            "/sequence/{id}",
            get(records::get_one::<SequenceFile>)
                .put(records::update::<SequenceFile>)
                .delete(records::delete::<SequenceFile>),
        )
        .route(
            "/variants",
            get(records::list::<VariantFile>).post(records::create::<VariantFile>),
        )
        .route("/variants/{id}", delete(records::delete::<VariantFile>))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_identity,
        ));

    let api = Router::new()
        .route("/login", post(handlers::login::login))
        .merge(protected);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}
