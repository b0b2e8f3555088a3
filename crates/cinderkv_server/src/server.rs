//! Router assembly and the serve loop.

use crate::error::ServerResult;
use crate::{handlers, middleware as mw, AppState};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Builds the application router with auth, whitelist, and deadline
/// middleware applied to every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/query/{key}", get(handlers::query))
        .route(
            "/{kind}/{key}",
            get(handlers::get_typed)
                .put(handlers::put_typed)
                .delete(handlers::delete_typed),
        )
        .fallback(handlers::fallback)
        .layer(middleware::from_fn(mw::enforce_deadline))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::check_auth,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::check_allow_ip,
        ))
        .with_state(state)
}

/// Binds the listener on the configured port, all interfaces.
pub async fn bind(port: u16) -> ServerResult<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    Ok(TcpListener::bind(addr).await?)
}

/// Serves requests until `shutdown` resolves.
///
/// Connections use HTTP keep-alive; peer addresses are propagated so the
/// whitelist middleware can see them.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "http api server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
