use std::{convert::Infallible, net::{IpAddr, Ipv4Addr, SocketAddr}, sync::Arc};

use anyhow::Context;
use context::{DashboardConfig, DashboardContext, DashboardContextRef};
use handler::{FrameQuery, HistoryQuery};
use relief_data::{RecordStore, SqliteDocumentStore, DEFAULT_STORE_PATH};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warp::{reject::Rejection, Filter, Reply};

mod context;
mod frame;
mod handler;
mod page;

type Result<T> = std::result::Result<T, Rejection>;

const PORT: u16 = 8501;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store: Arc<dyn RecordStore> = Arc::new(SqliteDocumentStore::connect_lazy(DEFAULT_STORE_PATH));
    let config = DashboardConfig::default();
    let port = config.port;
    let context_ref = Arc::new(RwLock::new(DashboardContext::new(store, config)));

    let addr = SocketAddr::new(IpAddr::from(Ipv4Addr::UNSPECIFIED), port);
    let (bound, server) = warp::serve(routes(context_ref))
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("ctrl-c received, shutting down");
        })
        .with_context(|| format!("failed to bind to port {port}, is another dashboard running?"))?;

    info!("Local:   http://127.0.0.1:{}", bound.port());
    if let Ok(local_ip) = local_ip_address::local_ip() {
        info!("Network: http://{}:{}", local_ip, bound.port());
    }
    server.await;
    Ok(())
}

fn routes(context_ref: DashboardContextRef) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let api_routes = warp::path("api").and(
        warp::path!("health").and(warp::get()).and_then(handler::health_handler)
            .or(warp::path!("session")
                .and(warp::post())
                .and(with_context(context_ref.clone()))
                .and_then(handler::create_session_handler))
            .or(warp::path!("frame")
                .and(warp::get())
                .and(warp::query::<FrameQuery>())
                .and(with_context(context_ref.clone()))
                .and_then(handler::frame_handler))
            .or(warp::path!("history")
                .and(warp::get())
                .and(warp::query::<HistoryQuery>())
                .and(with_context(context_ref))
                .and_then(handler::history_handler)),
    );

    let index_route = warp::path::end().and(warp::get()).and_then(handler::index_handler);

    index_route.or(api_routes).with(warp::cors().allow_any_origin())
}

fn with_context(context_ref: DashboardContextRef) -> impl Filter<Extract = (DashboardContextRef,), Error = Infallible> + Clone {
    warp::any().map(move || context_ref.clone())
}
