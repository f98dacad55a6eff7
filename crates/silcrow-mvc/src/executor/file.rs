// File: src/executor/file.rs
// Purpose: Executor for file results: headers, preconditions, ranges and streamed bodies

use async_trait::async_trait;
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED, RANGE,
};
use axum::body::Body;
use axum::http::StatusCode;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, ReadBuf};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use super::{unexpected, ResultExecutor};
use crate::conditional::{format_http_date, PreconditionState, Validators};
use crate::context::ActionContext;
use crate::error::Result;
use crate::range::{self, ByteRange, RangeOutcome};
use crate::result::{ActionResult, FileResult, FileSource, ResultKind, SeekableStream};

/// Body chunk size; cancellation is checked before each chunk.
const BUFFER_SIZE: usize = 64 * 1024;

/// Fails the next read once the request is cancelled, which ends the body
/// stream with an error and stops the host from flushing further bytes.
struct CancellableReader<R> {
    inner: R,
    cancellation: CancellationToken,
}

impl<R: AsyncRead + Unpin> AsyncRead for CancellableReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.cancellation.is_cancelled() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "the request was cancelled",
            )));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// An opened source with its length, when known.
enum OpenedFile {
    Bytes(Bytes),
    Seekable(Box<dyn SeekableStream>),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

struct Opened {
    body: OpenedFile,
    length: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
}

pub struct FileResultExecutor;

impl FileResultExecutor {
    async fn open(source: FileSource, last_modified: Option<DateTime<Utc>>) -> Result<Opened> {
        Ok(match source {
            FileSource::Bytes(bytes) => Opened {
                length: Some(bytes.len() as u64),
                body: OpenedFile::Bytes(bytes),
                last_modified,
            },
            FileSource::Stream(mut stream) => {
                let length = stream.seek(SeekFrom::End(0)).await?;
                stream.seek(SeekFrom::Start(0)).await?;
                Opened {
                    body: OpenedFile::Seekable(stream),
                    length: Some(length),
                    last_modified,
                }
            }
            FileSource::Reader(reader) => Opened {
                body: OpenedFile::Reader(reader),
                length: None,
                last_modified,
            },
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let metadata = file.metadata().await?;
                Opened {
                    length: Some(metadata.len()),
                    last_modified: last_modified
                        .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from)),
                    body: OpenedFile::Seekable(Box::new(file)),
                }
            }
        })
    }

    fn set_headers(ctx: &mut ActionContext, result: &FileResult, opened: &Opened) -> Result<()> {
        ctx.response
            .set_header(CONTENT_TYPE, &result.content_type.to_string())?;
        if let Some(disposition) = result.content_disposition() {
            ctx.response.set_header(CONTENT_DISPOSITION, &disposition)?;
        }
        if result.enable_range_processing {
            ctx.response.set_header(ACCEPT_RANGES, "bytes")?;
        }
        if let Some(last_modified) = &opened.last_modified {
            ctx.response
                .set_header(LAST_MODIFIED, &format_http_date(last_modified))?;
        }
        if let Some(etag) = &result.etag {
            ctx.response.set_header(ETAG, &etag.to_string())?;
        }
        Ok(())
    }

    /// Attach `reader` as the response body, read in `BUFFER_SIZE` chunks.
    fn stream<R: AsyncRead + Send + Unpin + 'static>(ctx: &mut ActionContext, reader: R) -> Result<()> {
        let reader = CancellableReader {
            inner: reader,
            cancellation: ctx.cancellation.clone(),
        };
        let body = Body::from_stream(ReaderStream::with_capacity(reader, BUFFER_SIZE));
        ctx.response.stream_body(body)
    }

    async fn write_body(
        ctx: &mut ActionContext,
        body: OpenedFile,
        range: Option<ByteRange>,
    ) -> Result<()> {
        match body {
            OpenedFile::Bytes(bytes) => {
                let bytes = match range {
                    Some(range) => bytes.slice(range.start as usize..=range.end as usize),
                    None => bytes,
                };
                for chunk in bytes.chunks(BUFFER_SIZE) {
                    ctx.ensure_not_cancelled()?;
                    ctx.response.write_body(chunk);
                }
                Ok(())
            }
            OpenedFile::Seekable(mut stream) => {
                ctx.ensure_not_cancelled()?;
                match range {
                    Some(range) => {
                        stream.seek(SeekFrom::Start(range.start)).await?;
                        Self::stream(ctx, stream.take(range.byte_count()))
                    }
                    None => Self::stream(ctx, stream),
                }
            }
            OpenedFile::Reader(reader) => {
                ctx.ensure_not_cancelled()?;
                Self::stream(ctx, reader)
            }
        }
    }
}

#[async_trait]
impl ResultExecutor for FileResultExecutor {
    async fn execute(&self, ctx: &mut ActionContext, result: ActionResult) -> Result<()> {
        let mut result = match result {
            ActionResult::File(result) => result,
            other => return Err(unexpected(ResultKind::File, &other)),
        };

        tracing::info!(
            "Executing FileResult, sending file with download name '{}'",
            result.download_name.as_deref().unwrap_or("")
        );

        let source = std::mem::replace(&mut result.source, FileSource::Bytes(Bytes::new()));
        let opened = Self::open(source, result.last_modified).await?;
        Self::set_headers(ctx, &result, &opened)?;

        let validators = Validators {
            etag: result.etag.as_ref(),
            last_modified: opened.last_modified,
        };
        match validators.precondition_state(&ctx.request) {
            PreconditionState::NotModified => {
                tracing::debug!("The file was not modified since the requested date");
                return ctx.response.set_status(StatusCode::NOT_MODIFIED);
            }
            PreconditionState::PreconditionFailed => {
                tracing::debug!("The file failed a request precondition");
                return ctx.response.set_status(StatusCode::PRECONDITION_FAILED);
            }
            PreconditionState::Unspecified | PreconditionState::ShouldProcess => {}
        }

        let mut requested_range = None;
        if let Some(length) = opened.length {
            let ranges_allowed = result.enable_range_processing
                && length > 0
                && ctx.request.is_get_or_head()
                && validators.if_range_allows(&ctx.request);

            if ranges_allowed {
                match range::evaluate(ctx.request.header(RANGE), length) {
                    RangeOutcome::Full => {}
                    RangeOutcome::Partial(partial) => requested_range = Some(partial),
                    RangeOutcome::Unsatisfiable => {
                        tracing::debug!("The requested range is not satisfiable for length {}", length);
                        ctx.response.set_status(StatusCode::RANGE_NOT_SATISFIABLE)?;
                        ctx.response
                            .set_header(CONTENT_RANGE, &range::unsatisfiable_content_range(length))?;
                        return ctx.response.set_content_length(0);
                    }
                }
            }

            match requested_range {
                Some(partial) => {
                    ctx.response.set_status(StatusCode::PARTIAL_CONTENT)?;
                    ctx.response
                        .set_header(CONTENT_RANGE, &partial.content_range(length))?;
                    ctx.response.set_content_length(partial.byte_count())?;
                }
                None => ctx.response.set_content_length(length)?,
            }
        }

        if ctx.request.is_head() {
            return Ok(());
        }
        Self::write_body(ctx, opened.body, requested_range).await
    }
}
