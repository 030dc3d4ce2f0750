use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWrite;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::http::mime;
use crate::http::request::{Method, Request};
use crate::http::response::{ErrorResponse, StatusCode, SuccessHeader};
use crate::http::writer::ResponseWriter;

const ROOT_URI: &str = "/";
const SUPPORTED_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

/// What answering one request produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    /// Whether this request allows the connection to stay open.
    pub keep_alive: bool,
}

/// Turns requests into responses against the document root.
///
/// Every protocol problem is answered inline; `Err` is reserved for failures
/// writing to the client.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn dispatch<W>(&self, req: &Request, out: &mut W) -> anyhow::Result<Outcome>
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = ResponseWriter::new(out);
        let keep_alive = req.keep_alive();

        if let Some(problem) = &req.error {
            let response = ErrorResponse::bad_request(format!("{} ", problem), &req.request_line);
            error!("{}", response.render().trim_end());
            writer.write_error(&response).await?;
            return Ok(Outcome {
                status: response.status(),
                keep_alive: false,
            });
        }

        if !SUPPORTED_VERSIONS.contains(&req.version.as_str()) {
            let response = ErrorResponse::bad_request("Invalid HTTP-Version: ", &req.version);
            return self.reject(&mut writer, response, keep_alive).await;
        }

        match Method::from_str(&req.method) {
            Some(method) if method.is_implemented() => {}
            Some(method) => {
                tracing::debug!(?method, "method not implemented");
                let response = ErrorResponse::bad_request("Invalid Method: ", &req.method);
                return self.reject(&mut writer, response, keep_alive).await;
            }
            None => {
                warn!(token = %req.method, "unrecognized method token");
                let response = ErrorResponse::bad_request("Invalid Method: ", &req.method);
                return self.reject(&mut writer, response, keep_alive).await;
            }
        }

        if req.uri.split('/').any(|segment| segment == "..") {
            let response = ErrorResponse::bad_request("Invalid URI: ", &req.uri);
            return self.reject(&mut writer, response, keep_alive).await;
        }

        let target = match self.resolve(req).await {
            Some(target) => target,
            None => {
                let response = ErrorResponse::not_found(&req.uri);
                return self.reject(&mut writer, response, keep_alive).await;
            }
        };

        let file = match File::open(&target.full_path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %target.full_path.display(), error = %e, "couldn't open file");
                return self
                    .reject(&mut writer, ErrorResponse::InternalError, keep_alive)
                    .await;
            }
        };

        let ext = mime::extension_of(&target.uri);
        if !self.config.ext_allowed(ext) {
            warn!(extension = ext, "file type restricted");
            let response = ErrorResponse::not_implemented(&req.uri);
            return self.reject(&mut writer, response, keep_alive).await;
        }

        let len = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %target.full_path.display(), error = %e, "couldn't stat file");
                return self
                    .reject(&mut writer, ErrorResponse::InternalError, keep_alive)
                    .await;
            }
        };

        let header = SuccessHeader::new(self.config.mime_for(ext), len, keep_alive);
        writer.write_file(&header, file).await?;

        info!(
            "<{}>: {} ~ ({})",
            StatusCode::Ok.as_u16(),
            target.uri,
            if keep_alive { "KEEP-ALIVE" } else { "CLOSE" }
        );

        Ok(Outcome {
            status: StatusCode::Ok,
            keep_alive,
        })
    }

    /// Maps the request onto a regular file under the document root.
    ///
    /// `/` is served by the first index candidate that exists.
    async fn resolve(&self, req: &Request) -> Option<Target> {
        if req.uri == ROOT_URI {
            for page in self.config.index_pages() {
                let mut candidate = Request::new();
                candidate.set_uri(self.config.file_root(), format!("/{}", page));
                tracing::debug!(path = %candidate.full_path.display(), "trying index page");

                if is_file(&candidate.full_path).await {
                    return Some(Target {
                        uri: candidate.uri,
                        full_path: candidate.full_path,
                    });
                }
            }
            return None;
        }

        if is_file(&req.full_path).await {
            Some(Target {
                uri: req.uri.clone(),
                full_path: req.full_path.clone(),
            })
        } else {
            None
        }
    }

    async fn reject<W>(
        &self,
        writer: &mut ResponseWriter<'_, W>,
        response: ErrorResponse,
        keep_alive: bool,
    ) -> anyhow::Result<Outcome>
    where
        W: AsyncWrite + Unpin,
    {
        warn!("<{}>: {}", response.status().as_u16(), response.render().trim_end());
        writer.write_error(&response).await?;
        Ok(Outcome {
            status: response.status(),
            keep_alive,
        })
    }
}

struct Target {
    uri: String,
    full_path: std::path::PathBuf,
}

async fn is_file(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
