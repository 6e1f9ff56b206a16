//! nanit-proxy - a local HTTP service in front of the Nanit API.
//!
//! Clients speak bearer-token JSON under `/api`; the proxy forwards each
//! request to the vendor with its own `token` scheme and headers. Clients
//! hold their own tokens and refresh them through `/api/auth/refresh`, so the
//! proxy keeps no session state.
//!
//! | route | vendor call |
//! |-------|-------------|
//! | `POST /api/auth/login` | login; 482 with the challenge when MFA is needed |
//! | `POST /api/auth/verify-mfa` | login with the one-time code |
//! | `POST /api/auth/refresh` | token refresh |
//! | `GET /api/babies` | babies |
//! | `GET /api/calendar/{baby_uid}?start=&end=` | calendar |

mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use nanit_core::VendorApi;

pub use error::ProxyError;
pub use routes::{AppState, router};

/// Bind `addr` and serve the proxy until Ctrl-C.
pub async fn serve<V: VendorApi + 'static>(addr: SocketAddr, vendor: Arc<V>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "nanit proxy listening");

    axum::serve(listener, router(vendor))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
