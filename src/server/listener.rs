use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span};

use crate::config::Config;
use crate::http::connection::Connection;

/// Accepts clients and hands each one to its own connection task.
pub struct Server {
    listener: TcpListener,
    config: Arc<Config>,
    next_id: u64,
}

impl Server {
    /// Binds the configured address. Failing here is a startup fault.
    pub async fn bind(config: Arc<Config>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        Ok(Self {
            listener,
            config,
            next_id: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts until the listener itself fails.
    ///
    /// Connection tasks are detached. Errors that concern only the incoming
    /// connection are skipped; any other accept error is returned so the
    /// caller can shut down.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) if is_per_connection(&e) => {
                    debug!("Dropped incoming connection: {}", e);
                    continue;
                }
                Err(e) => {
                    error!("Got error <{}> on the connection listener. Shutting down.", e);
                    return Err(e.into());
                }
            };

            self.next_id += 1;
            let id = self.next_id;
            debug!(conn = id, "Accepted connection from {}", peer);

            let config = Arc::clone(&self.config);
            let span = info_span!("conn", id, %peer);
            tokio::spawn(
                async move {
                    let conn = Connection::new(id, socket, config);
                    if let Err(e) = conn.run().await {
                        debug!("Connection error: {}", e);
                    }
                }
                .instrument(span),
            );
        }
    }
}

/// Accept errors caused by the client being accepted, not by the listener.
fn is_per_connection(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
