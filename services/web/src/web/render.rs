//! services/web/src/web/render.rs
//!
//! HTML response plumbing: pooled output buffers, escaping, and the data every
//! full page needs (title, flash, CSRF token).

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use crate::web::error::AppError;
use crate::web::session::SessionContext;

//=========================================================================================
// Buffer Pool
//=========================================================================================

/// Idle buffers kept for reuse; anything beyond this is dropped.
const MAX_IDLE_BUFFERS: usize = 64;
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Reusable output buffers shared by all requests.
#[derive(Default)]
pub struct BufferPool {
    idle: Mutex<Vec<String>>,
}

impl BufferPool {
    /// Takes a cleared buffer from the pool, or allocates one.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_else(|| String::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { buf, pool: self }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn release(&self, mut buf: String) {
        buf.clear();
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_BUFFERS {
                idle.push(buf);
            }
        }
    }
}

/// A buffer on loan from a `BufferPool`; returned when dropped.
pub struct PooledBuffer<'a> {
    buf: String,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

//=========================================================================================
// Renderer
//=========================================================================================

/// Renders HTML into pooled buffers and wraps the result in a response.
#[derive(Clone, Default)]
pub struct Renderer {
    pool: Arc<BufferPool>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Runs `write` against a pooled buffer and returns its output as a
    /// `text/html` response with `status`.
    pub fn html(
        &self,
        status: StatusCode,
        write: impl FnOnce(&mut String) -> fmt::Result,
    ) -> Result<Response, AppError> {
        let mut buf = self.pool.acquire();
        write(&mut *buf).map_err(|e| AppError::Internal(format!("failed to render page: {e}")))?;
        let body = Bytes::copy_from_slice(buf.as_bytes());
        Ok((
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response())
    }
}

//=========================================================================================
// Escaping
//=========================================================================================

/// Displays the wrapped text with HTML special characters escaped.
pub struct Escape<'a>(pub &'a str);

impl fmt::Display for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            let replacement = match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(replacement)?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

pub fn esc(s: &str) -> Escape<'_> {
    Escape(s)
}

//=========================================================================================
// Page Data
//=========================================================================================

/// What the shared layout needs for every full page.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub title: String,
    pub flash: Option<String>,
    pub csrf_token: String,
    pub authenticated: bool,
}

impl PageData {
    /// Consumes the session's pending flash and issues its CSRF token.
    pub async fn load(session: &SessionContext, title: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            title: title.into(),
            flash: session.pop_flash().await?,
            csrf_token: session.csrf_token().await?,
            authenticated: session.user_id().await?.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            esc(r#"<a href="x">Tom & 'Jerry'</a>"#).to_string(),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(esc("plain").to_string(), "plain");
        assert_eq!(esc("日本 & co").to_string(), "日本 &amp; co");
    }

    #[test]
    fn buffers_return_to_the_pool_cleared() {
        let pool = BufferPool::default();
        {
            let mut buf = pool.acquire();
            buf.push_str("leftover");
        }
        assert_eq!(pool.idle_count(), 1);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= "leftover".len());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn render_produces_html_response() {
        let renderer = Renderer::new();
        let response = renderer
            .html(StatusCode::UNPROCESSABLE_ENTITY, |out| {
                out.push_str("<p>hi</p>");
                Ok(())
            })
            .expect("rendered");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(renderer.pool().idle_count(), 1);
    }
}
