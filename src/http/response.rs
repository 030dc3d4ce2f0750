use std::time::SystemTime;

const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes the server answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use staticd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// `HTTP/1.1 <code> <reason>`, without a line terminator.
    pub fn status_line(&self) -> String {
        format!("{} {} {}", HTTP_VERSION, self.as_u16(), self.reason_phrase())
    }
}

/// A response that carries no body: the status line is the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorResponse {
    /// `text` is appended directly after `problem`, e.g. `Invalid Method: ` + `FOO`.
    BadRequest { problem: String, text: String },
    NotFound { uri: String },
    InternalError,
    NotImplemented { uri: String },
}

impl ErrorResponse {
    pub fn bad_request(problem: impl Into<String>, text: impl Into<String>) -> Self {
        ErrorResponse::BadRequest {
            problem: problem.into(),
            text: text.into(),
        }
    }

    pub fn not_found(uri: impl Into<String>) -> Self {
        ErrorResponse::NotFound { uri: uri.into() }
    }

    pub fn not_implemented(uri: impl Into<String>) -> Self {
        ErrorResponse::NotImplemented { uri: uri.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorResponse::BadRequest { .. } => StatusCode::BadRequest,
            ErrorResponse::NotFound { .. } => StatusCode::NotFound,
            ErrorResponse::InternalError => StatusCode::InternalServerError,
            ErrorResponse::NotImplemented { .. } => StatusCode::NotImplemented,
        }
    }

    /// The exact bytes written to the client.
    pub fn render(&self) -> String {
        let status = self.status().status_line();
        match self {
            ErrorResponse::BadRequest { problem, text } => {
                format!("{}: {}{}\n\n", status, problem, text)
            }
            ErrorResponse::NotFound { uri } | ErrorResponse::NotImplemented { uri } => {
                format!("{}: {}\n\n", status, uri)
            }
            ErrorResponse::InternalError => format!("{}: cannot allocate memory\n", status),
        }
    }
}

/// Header block preceding a served file.
#[derive(Debug, Clone)]
pub struct SuccessHeader {
    pub keep_alive: bool,
    pub date: SystemTime,
    pub content_type: String,
    pub content_length: u64,
}

impl SuccessHeader {
    pub fn new(content_type: impl Into<String>, content_length: u64, keep_alive: bool) -> Self {
        Self {
            keep_alive,
            date: SystemTime::now(),
            content_type: content_type.into(),
            content_length,
        }
    }

    pub fn render(&self) -> String {
        let connection = if self.keep_alive { "keep-alive" } else { "close" };
        format!(
            "{}\nConnection: {}\nDate: {}\nContent-Type: {}\nContent-Length: {}\n\n",
            StatusCode::Ok.status_line(),
            connection,
            httpdate::fmt_http_date(self.date),
            self.content_type,
            self.content_length,
        )
    }
}
