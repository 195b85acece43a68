//! TCP accept loop collaborator.
//!
//! Each accepted connection is processed on its own spawned task as a fully
//! independent unit of work; no state is shared between connections. The
//! accept loop itself is stopped through a shutdown channel, so
//! [`Server::close`] races cleanly with in-flight `accept` calls.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;

/// A running server: a bound listener plus its spawned accept task.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl Server {
    /// Binds the address and starts accepting in a background task,
    /// dispatching every connection to its own task running the handler.
    pub async fn serve<H>(addr: impl ToSocketAddrs, handler: H) -> io::Result<Self>
    where
        H: Handler + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, mut shutdown_seen) = watch::channel(false);
        let handler = Arc::new(handler);

        let accept_task = tokio::spawn(async move {
            loop {
                select! {
                    _ = shutdown_seen.changed() => {
                        info!("server closed, stop accepting");
                        return;
                    }

                    accepted = listener.accept() => match accepted {
                        Ok((stream, remote_addr)) => {
                            info!(%remote_addr, "connection accepted");
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = HttpConnection::new(reader, writer).process(handler).await {
                                    error!(cause = %e, "connection ended with error");
                                }
                            });
                        }
                        Err(e) => warn!(cause = %e, "failed to accept"),
                    },
                }
            }
        });

        info!(%local_addr, "server listening");
        Ok(Self { local_addr, shutdown, accept_task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections; connections already dispatched run
    /// to completion on their own tasks.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.accept_task.await;
    }
}
