use std::path::{Path, PathBuf};

use async_std::fs;
use async_std::io::Write;
use tracing::{debug, warn};

use crate::handler::responses;
use crate::http::error::ResponseError;
use crate::http::response::ResponseWriter;
use crate::http::status::HttpStatus;

/// Sends the file at `path` below `root` as a fixed-length body.
///
/// A path escaping `root` gets `400`; a file that cannot be read gets `500`.
pub async fn serve<W>(
    w: &mut ResponseWriter<W>,
    root: &Path,
    path: &str,
    server_name: &str,
) -> Result<(), ResponseError>
where
    W: Write + Unpin,
{
    let Some(relative) = sanitize_path(path) else {
        debug!(path, "rejecting static file path");
        return responses::html(w, HttpStatus::BadRequest, responses::BAD_REQUEST_PAGE, server_name).await;
    };

    let full_path = root.join(&relative);
    let body = match fs::read(&full_path).await {
        Ok(body) => body,
        Err(err) => {
            warn!(path = %full_path.display(), error = %err, "could not read static file");
            return responses::html(
                w,
                HttpStatus::InternalServerError,
                responses::INTERNAL_ERROR_PAGE,
                server_name,
            )
            .await;
        }
    };

    debug!(path = %full_path.display(), len = body.len(), "serving static file");
    responses::send(w, HttpStatus::Ok, guess_mime(&relative), &body, server_name).await
}

/// Turns a request path into a relative file path, dropping the query.
/// Returns `None` for `..` segments, backslashes, and paths naming no file.
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let path = path.split_once('?').map_or(path, |(path, _)| path);

    let mut clean = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') => return None,
            s => clean.push(s),
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("htm" | "html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_paths() {
        assert_eq!(sanitize_path("/css/site.css"), Some(PathBuf::from("css/site.css")));
        assert_eq!(sanitize_path("//a/./b.txt?v=2"), Some(PathBuf::from("a/b.txt")));
    }

    #[test]
    fn sanitize_rejects_escapes() {
        assert_eq!(sanitize_path("/../etc/passwd"), None);
        assert_eq!(sanitize_path("/a/../../b"), None);
        assert_eq!(sanitize_path("/a\\..\\b"), None);
        assert_eq!(sanitize_path("/"), None);
        assert_eq!(sanitize_path(""), None);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("vim.mp4")), "video/mp4");
        assert_eq!(guess_mime(Path::new("INDEX.HTML")), "text/html");
        assert_eq!(guess_mime(Path::new("data")), "application/octet-stream");
    }
}
