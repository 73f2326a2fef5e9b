/// Status codes the [`ResponseWriter`](crate::http::response::ResponseWriter) can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,

    BadRequest = 400,

    InternalServerError = 500,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason_phrase(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }
}
