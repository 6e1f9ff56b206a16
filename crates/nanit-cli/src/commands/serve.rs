//! Serve command implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result, ensure};
use clap::Args;

use nanit_http::NanitClient;

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::client_config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "NANIT_PROXY_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,
}

pub async fn run(args: ServeArgs, connection: &ConnectionArgs) -> Result<()> {
    ensure!(
        !connection.proxy,
        "--proxy selects a proxy as the upstream; serve needs the Nanit API"
    );

    let config = client_config(connection)?;
    output::note(&format!(
        "Forwarding http://{} to {}",
        args.addr, config.base_url
    ));
    let vendor = NanitClient::new(config).context("Failed to build HTTP client")?;

    nanit_proxy::serve(args.addr, Arc::new(vendor))
        .await
        .context("Proxy server failed")
}
