use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::config::Config;
use crate::http::dispatcher::Dispatcher;
use crate::http::parser::RequestParser;
use crate::http::request::Request;
use crate::http::timer::IdleTimer;

/// Why a connection was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client closed its side.
    Eof,
    /// Read failed, typically a reset.
    Reset,
    /// Idle timer fired, or the client stopped reading a response.
    Timeout,
    /// Last batch did not ask for keep-alive and its responses were flushed.
    WriteOut,
    /// Too many buffered bytes without a complete request.
    Overflow,
    /// Writing to the client failed.
    Error,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::Eof => "CLIENT EOF",
            CloseReason::Reset => "CLIENT RESET",
            CloseReason::Timeout => "TIMEOUT",
            CloseReason::WriteOut => "WRITEOUT",
            CloseReason::Overflow => "REQUEST TOO LARGE",
            CloseReason::Error => "WRITE ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    KeepAlive,
    Close,
}

/// One accepted client and everything it owns.
///
/// `run` consumes the connection, so teardown happens exactly once no
/// matter which of EOF, timeout, write-out or an I/O error ends it.
pub struct Connection<S> {
    id: u64,
    stream: BufWriter<S>,
    inbound: BytesMut,
    timer: IdleTimer,
    parser: RequestParser,
    dispatcher: Dispatcher,
    max_request_bytes: usize,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: u64, stream: S, config: Arc<Config>) -> Self {
        Self {
            id,
            stream: BufWriter::new(stream),
            inbound: BytesMut::with_capacity(4096),
            timer: IdleTimer::new(config.idle_timeout()),
            parser: RequestParser::new(config.file_root()),
            max_request_bytes: config.max_request_bytes(),
            dispatcher: Dispatcher::new(config),
        }
    }

    /// Serves the client until one of the close triggers fires.
    ///
    /// A fresh connection is on the idle clock too, so a client that never
    /// sends anything is reaped.
    pub async fn run(mut self) -> anyhow::Result<CloseReason> {
        self.timer.arm();
        let result = self.serve().await;
        let reason = match &result {
            Ok(reason) => *reason,
            Err(_) => CloseReason::Error,
        };
        self.close(reason).await;
        result
    }

    async fn serve(&mut self) -> anyhow::Result<CloseReason> {
        loop {
            tokio::select! {
                read = self.stream.read_buf(&mut self.inbound) => {
                    match read {
                        Ok(0) => return Ok(CloseReason::Eof),
                        Ok(_) => {
                            if let Some(reason) = self.on_readable().await? {
                                return Ok(reason);
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "read failed");
                            return Ok(CloseReason::Reset);
                        }
                    }
                }
                _ = self.timer.expired() => return Ok(CloseReason::Timeout),
            }
        }
    }

    /// Handles one readable event. `Some` means the connection must close.
    async fn on_readable(&mut self) -> anyhow::Result<Option<CloseReason>> {
        self.timer.disarm();

        let batch = self.parser.parse(&mut self.inbound);
        if batch.is_empty() {
            if self.inbound.len() > self.max_request_bytes {
                return Ok(Some(CloseReason::Overflow));
            }
            // partial request, wait for the rest on the idle clock
            self.timer.arm();
            return Ok(None);
        }

        debug!(requests = batch.len(), "servicing pipelined requests");

        // writes share the idle deadline so a client that stops reading is reaped
        let deadline = self.timer.timeout();
        let written = tokio::time::timeout(deadline, self.write_batch(&batch)).await;
        let disposition = match written {
            Ok(disposition) => disposition?,
            Err(_) => {
                debug!("client stopped reading");
                return Ok(Some(CloseReason::Timeout));
            }
        };

        match disposition {
            Disposition::KeepAlive => {
                debug!("keep-alive = true");
                if self.inbound.len() > self.max_request_bytes {
                    return Ok(Some(CloseReason::Overflow));
                }
                self.timer.arm();
                Ok(None)
            }
            Disposition::Close => {
                debug!("keep-alive = false");
                Ok(Some(CloseReason::WriteOut))
            }
        }
    }

    /// Answers every request of the batch in order and flushes the replies.
    async fn write_batch(&mut self, batch: &[Request]) -> anyhow::Result<Disposition> {
        let mut disposition = Disposition::Close;
        for req in batch {
            let outcome = self.dispatcher.dispatch(req, &mut self.stream).await?;
            disposition = if outcome.keep_alive {
                Disposition::KeepAlive
            } else {
                Disposition::Close
            };
        }
        self.stream.flush().await?;
        Ok(disposition)
    }

    async fn close(mut self, reason: CloseReason) {
        debug!(conn = self.id, "Closing ({})", reason);
        self.timer.disarm();
        if reason != CloseReason::Error && reason != CloseReason::Reset {
            // shut the socket itself; flushing leftovers could block on a stalled peer
            let _ = self.stream.get_mut().shutdown().await;
        }
    }
}
