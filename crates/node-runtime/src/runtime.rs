//! # Node Runtime
//!
//! Startup sequence:
//!
//! 1. Bind the API listener
//! 2. Start discovery and keepalive
//! 3. Serve HTTP + websocket until shutdown
//!
//! Shutdown stops the loops, closes every peer link with 1001 and waits for
//! the server to drain.

use crate::container::ServiceContainer;
use crate::server::{router, AppState};
use flux_gossip::GossipHandle;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Close code sent to peers when this node stops.
pub const GOING_AWAY_CODE: u16 = 1001;

/// A running node.
pub struct NodeRuntime {
    container: Arc<ServiceContainer>,
    local_addr: SocketAddr,
    gossip: GossipHandle,
    server: JoinHandle<io::Result<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Bind `network.bind_address:network.api_port` and start.
    pub async fn start(container: ServiceContainer) -> io::Result<Self> {
        let addr = format!(
            "{}:{}",
            container.config.network.bind_address, container.config.network.api_port
        );
        let listener = TcpListener::bind(&addr).await?;
        Self::start_on(container, listener).await
    }

    /// Start on an already bound listener.
    pub async fn start_on(container: ServiceContainer, listener: TcpListener) -> io::Result<Self> {
        let container = Arc::new(container);
        let local_addr = listener.local_addr()?;

        let gossip = container.gossip.start();

        let app = router(AppState {
            api: Arc::clone(&container.api),
            inbound: Arc::clone(container.gossip.inbound()),
        });
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
        });

        info!(
            addr = %local_addr,
            public_key = %container.identity.public_key(None).unwrap_or_default(),
            "Flux node listening"
        );

        Ok(Self {
            container,
            local_addr,
            gossip,
            server,
            shutdown_tx,
        })
    }

    /// Address the API listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The wired services.
    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    /// Stop everything and wait for the server to finish.
    pub async fn shutdown(self) {
        info!("Shutting down Flux node...");
        self.gossip.shutdown().await;

        let registries = [
            self.container.gossip.outgoing(),
            self.container.gossip.incoming(),
        ];
        for registry in registries {
            for entry in registry.snapshot() {
                entry.close(GOING_AWAY_CODE, "node shutting down");
            }
        }

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        match self.server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "HTTP server error"),
            Err(e) => error!("Server task ended abnormally: {}", e),
        }
        info!("Flux node stopped");
    }
}
