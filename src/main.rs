mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::{AuthService, TokenService};
use crate::features::files::handlers::FilesState;
use crate::features::files::routes as files_routes;
use crate::features::files::FileService;
use crate::features::items::handlers::ItemsState;
use crate::features::items::routes as items_routes;
use crate::features::items::ItemService;
use crate::modules::cache::CacheClient;
use crate::modules::events::EventDispatcher;
use crate::modules::mailer::Mailer;
use crate::modules::metrics;
use crate::modules::queue::QueuePublisher;
use crate::modules::realtime::{self, RealtimeHub, RealtimeState};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize Prometheus recorder before anything records a metric
    metrics::init_metrics();

    // Connect cache; an unreachable Redis degrades to a disabled client
    let cache = CacheClient::connect(&config.redis).await;

    // Initialize SMTP transport
    let mailer = Arc::new(
        Mailer::new(&config.smtp).map_err(|e| anyhow::anyhow!("Failed to build mailer: {}", e))?,
    );
    tracing::info!("Mailer initialized for {}", config.smtp.host);

    // Spawn the queue publisher supervisor; it connects and reconnects in
    // the background while publishes skip silently when disconnected
    let queue = Arc::new(QueuePublisher::new(&config.amqp));
    tokio::spawn(Arc::clone(&queue).run());
    tracing::info!("Queue publisher supervisor spawned");

    // Realtime hub for per-owner WebSocket groups
    let hub = Arc::new(RealtimeHub::new());

    // Auth services
    let token_service = Arc::new(TokenService::new(config.auth.clone()));
    let auth_service = Arc::new(AuthService::new(
        pool.clone(),
        Arc::clone(&token_service),
        Arc::clone(&mailer),
    ));
    tracing::info!("Auth service initialized");

    // Fan-out dispatcher shared by every mutating handler
    let dispatcher = Arc::new(EventDispatcher::new(
        cache.clone(),
        Arc::clone(&hub),
        Arc::clone(&queue),
        Arc::clone(&mailer),
    ));

    let item_service = Arc::new(ItemService::new(pool.clone(), cache.clone()));
    let file_service = Arc::new(FileService::new(
        pool.clone(),
        cache.clone(),
        config.storage.clone(),
    ));
    tracing::info!("Item and file services initialized");

    let max_file_size = file_service.max_file_size();

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require bearer authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(items_routes::protected_routes(ItemsState {
            service: item_service,
            dispatcher: Arc::clone(&dispatcher),
        }))
        .merge(files_routes::protected_routes(
            FilesState {
                service: file_service,
                dispatcher: Arc::clone(&dispatcher),
            },
            max_file_size,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&token_service),
            middleware::auth_middleware,
        ));

    // WebSocket endpoint authenticates itself at handshake time, so it sits
    // outside the bearer middleware
    let realtime_routes = Router::new()
        .route("/api/ws", axum::routing::get(realtime::ws_handler))
        .with_state(RealtimeState {
            hub: Arc::clone(&hub),
            tokens: Arc::clone(&token_service),
        });

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }

    async fn metrics_endpoint() -> String {
        metrics::render_metrics().unwrap_or_default()
    }

    let public_routes = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .route("/health", axum::routing::get(health_check))
        .route("/metrics", axum::routing::get(metrics_endpoint));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(realtime_routes)
        .merge(public_routes)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
