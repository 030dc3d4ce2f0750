use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{ErrorResponse, SuccessHeader};

/// Appends responses to a connection's outbound stream.
///
/// Nothing is flushed here; the connection flushes once per batch so that
/// pipelined responses leave in the order they were written.
pub struct ResponseWriter<'a, W> {
    out: &'a mut W,
}

impl<'a, W> ResponseWriter<'a, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }

    pub async fn write_error(&mut self, response: &ErrorResponse) -> anyhow::Result<()> {
        self.out.write_all(response.render().as_bytes()).await?;
        Ok(())
    }

    /// Writes the header, exactly `content_length` bytes of `file`, then `\n`.
    ///
    /// The file is copied straight into the outbound stream, never loaded
    /// whole. A file that shrank underneath us leaves the response short,
    /// which is reported as an error so the connection is dropped.
    pub async fn write_file(
        &mut self,
        header: &SuccessHeader,
        file: File,
    ) -> anyhow::Result<()> {
        self.out.write_all(header.render().as_bytes()).await?;

        let mut body = file.take(header.content_length);
        let copied = tokio::io::copy(&mut body, &mut *self.out).await?;
        if copied != header.content_length {
            return Err(anyhow::anyhow!(
                "file ended after {} of {} bytes",
                copied,
                header.content_length
            ));
        }

        self.out.write_all(b"\n").await?;
        Ok(())
    }
}
