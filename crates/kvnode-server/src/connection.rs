//! Per-connection serve loop, grounded on `dekaf::main::serve`: acquire a
//! connection-limit permit, frame the socket, and dispatch one command at
//! a time until the client disconnects or the process is shutting down.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use kvnode_core::Dispatcher;
use kvnode_proposer::ConsensusLog;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

pub async fn serve<L>(
    dispatcher: Dispatcher<L>,
    socket: TcpStream,
    addr: std::net::SocketAddr,
    connection_limit: Arc<tokio::sync::Semaphore>,
    idle_timeout: std::time::Duration,
    stop: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()>
where
    L: ConsensusLog + 'static,
{
    let permit = match connection_limit.try_acquire() {
        Ok(permit) => permit,
        Err(_) => {
            metrics::counter!("kvnode_rejected_connections", "reason" => "over_limit").increment(1);
            anyhow::bail!("connection limit reached, rejecting {addr}");
        }
    };

    tracing::info!(%addr, "accepted client connection");
    socket.set_nodelay(true)?;
    metrics::gauge!("kvnode_total_connections").increment(1.0);

    let mut framed = Framed::new(socket, kvnode_wire::RespCodec);

    let result = async {
        loop {
            tokio::select! {
                frame = tokio::time::timeout(idle_timeout, framed.next()) => {
                    let Ok(frame) = frame else {
                        tracing::debug!(%addr, "idle session timeout, closing");
                        return Ok(());
                    };
                    let Some(frame) = frame else {
                        return Ok(());
                    };
                    let frame = frame?;
                    let reply = dispatcher.dispatch(frame).await;
                    framed.send(reply).await?;
                }
                _ = stop.cancelled() => return Ok(()),
            }
        }
    }
    .await;

    metrics::gauge!("kvnode_total_connections").decrement(1.0);
    drop(permit);
    tracing::info!(%addr, "closed client connection");
    result
}
