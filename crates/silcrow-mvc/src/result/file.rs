// File: src/result/file.rs
// Purpose: File download results over bytes, streams and physical paths

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::conditional::EntityTag;
use crate::error::{MvcError, Result};
use crate::media_type::MediaType;

/// A readable, seekable byte stream whose length can be measured.
pub trait SeekableStream: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SeekableStream for T {}

/// Where the file's bytes come from.
pub enum FileSource {
    Bytes(Bytes),
    /// Length is measured by seeking; supports ranges
    Stream(Box<dyn SeekableStream>),
    /// Length unknown; always served whole
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// Absolute path on the local file system
    Path(PathBuf),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            FileSource::Stream(_) => f.write_str("Stream"),
            FileSource::Reader(_) => f.write_str("Reader"),
            FileSource::Path(path) => write!(f, "Path({:?})", path),
        }
    }
}

/// Sends a file, honouring range and conditional request headers.
#[derive(Debug)]
pub struct FileResult {
    pub source: FileSource,
    pub content_type: MediaType,
    /// Adds `Content-Disposition: attachment` when set
    pub download_name: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<EntityTag>,
    pub enable_range_processing: bool,
}

impl FileResult {
    fn with_source(source: FileSource, content_type: MediaType) -> Self {
        Self {
            source,
            content_type,
            download_name: None,
            last_modified: None,
            etag: None,
            enable_range_processing: false,
        }
    }

    pub fn bytes(contents: impl Into<Bytes>, content_type: &str) -> Result<Self> {
        Ok(Self::with_source(
            FileSource::Bytes(contents.into()),
            MediaType::parse(content_type)?,
        ))
    }

    pub fn stream<S: SeekableStream + 'static>(stream: S, content_type: &str) -> Result<Self> {
        Ok(Self::with_source(
            FileSource::Stream(Box::new(stream)),
            MediaType::parse(content_type)?,
        ))
    }

    pub fn reader<R: AsyncRead + Send + Unpin + 'static>(reader: R, content_type: &str) -> Result<Self> {
        Ok(Self::with_source(
            FileSource::Reader(Box::new(reader)),
            MediaType::parse(content_type)?,
        ))
    }

    /// Serve a file from disk. Without a content type one is guessed from
    /// the extension, falling back to `application/octet-stream`.
    pub fn physical(path: impl Into<PathBuf>, content_type: Option<&str>) -> Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(MvcError::invalid_argument(
                "path",
                format!("'{}' is not an absolute path", path.display()),
            ));
        }

        let content_type = match content_type {
            Some(content_type) => MediaType::parse(content_type)?,
            None => {
                let guessed = mime_guess::from_path(&path).first_or_octet_stream();
                MediaType::parse(guessed.essence_str())?
            }
        };
        Ok(Self::with_source(FileSource::Path(path), content_type))
    }

    pub fn download_name(mut self, name: impl Into<String>) -> Self {
        self.download_name = Some(name.into()).filter(|name: &String| !name.is_empty());
        self
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn etag(mut self, etag: EntityTag) -> Self {
        self.etag = Some(etag);
        self
    }

    pub fn enable_range_processing(mut self, enabled: bool) -> Self {
        self.enable_range_processing = enabled;
        self
    }

    /// `attachment; filename=...; filename*=UTF-8''...`
    pub fn content_disposition(&self) -> Option<String> {
        self.download_name.as_deref().map(content_disposition)
    }
}

fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    let fallback = if fallback.contains([' ', ';', ',', '"']) {
        format!("\"{}\"", fallback.replace('"', "\\\""))
    } else {
        fallback
    };

    format!(
        "attachment; filename={}; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_disposition() {
        let result = FileResult::bytes(vec![1, 2, 3], "application/pdf")
            .unwrap()
            .download_name("report.pdf");
        assert_eq!(
            result.content_disposition().unwrap(),
            "attachment; filename=report.pdf; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let result = FileResult::bytes(Bytes::new(), "text/plain")
            .unwrap()
            .download_name("résumé 2024.txt");
        assert_eq!(
            result.content_disposition().unwrap(),
            "attachment; filename=\"r_sum_ 2024.txt\"; filename*=UTF-8''r%C3%A9sum%C3%A9%202024.txt"
        );
    }

    #[test]
    fn test_empty_download_name_is_ignored() {
        let result = FileResult::bytes(Bytes::new(), "text/plain")
            .unwrap()
            .download_name("");
        assert_eq!(result.content_disposition(), None);
    }

    #[test]
    fn test_physical_requires_absolute_path() {
        assert!(matches!(
            FileResult::physical("relative/file.txt", None),
            Err(MvcError::InvalidArgument { name: "path", .. })
        ));
    }

    #[test]
    fn test_physical_guesses_content_type() {
        let result = FileResult::physical("/srv/files/logo.png", None).unwrap();
        assert_eq!(result.content_type.essence(), "image/png");

        let result = FileResult::physical("/srv/files/blob", None).unwrap();
        assert_eq!(result.content_type.essence(), "application/octet-stream");
    }

    #[test]
    fn test_invalid_content_type_rejected() {
        assert!(FileResult::bytes(Bytes::new(), "nonsense").is_err());
    }
}
