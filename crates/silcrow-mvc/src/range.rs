// File: src/range.rs
// Purpose: Single byte-range parsing and normalization for file responses

/// A satisfiable range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a 206 response.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// `Content-Range` value for a 416 response.
pub fn unsatisfiable_content_range(total: u64) -> String {
    format!("bytes */{}", total)
}

/// What a `Range` header asks for once checked against the file length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Header malformed, multi-range or absent: serve the whole file.
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Requested bounds before normalization. `None` start means a suffix range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawRange {
    start: Option<u64>,
    end: Option<u64>,
}

/// Parse `bytes=a-b`, `bytes=a-` or `bytes=-n`. Anything else yields `None`.
fn parse_single(header: &str) -> Option<RawRange> {
    let (unit, spec) = header.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }

    let spec = spec.trim();
    // multiple ranges are not supported
    if spec.contains(',') {
        return None;
    }

    let (start, end) = spec.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    let parse = |value: &str| -> Option<Option<u64>> {
        if value.is_empty() {
            Some(None)
        } else if value.bytes().all(|b| b.is_ascii_digit()) {
            value.parse::<u64>().ok().map(Some)
        } else {
            None
        }
    };

    let range = RawRange {
        start: parse(start)?,
        end: parse(end)?,
    };
    match (range.start, range.end) {
        (None, None) => None,
        (Some(start), Some(end)) if end < start => None,
        _ => Some(range),
    }
}

/// Evaluate a `Range` header against a file of `length` bytes.
/// Empty files are always served whole.
pub fn evaluate(header: Option<&str>, length: u64) -> RangeOutcome {
    if length == 0 {
        return RangeOutcome::Full;
    }
    let Some(range) = header.and_then(parse_single) else {
        return RangeOutcome::Full;
    };

    match (range.start, range.end) {
        (Some(start), end) => {
            if start >= length {
                return RangeOutcome::Unsatisfiable;
            }
            let end = end.map_or(length - 1, |end| end.min(length - 1));
            RangeOutcome::Partial(ByteRange { start, end })
        }
        (None, Some(suffix)) => {
            if suffix == 0 {
                return RangeOutcome::Unsatisfiable;
            }
            let bytes = suffix.min(length);
            RangeOutcome::Partial(ByteRange {
                start: length - bytes,
                end: length - 1,
            })
        }
        (None, None) => RangeOutcome::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bytes=0-99", RangeOutcome::Partial(ByteRange { start: 0, end: 99 }))]
    #[case("bytes = 10-19", RangeOutcome::Partial(ByteRange { start: 10, end: 19 }))]
    #[case("bytes=150-", RangeOutcome::Partial(ByteRange { start: 150, end: 199 }))]
    #[case("bytes=190-500", RangeOutcome::Partial(ByteRange { start: 190, end: 199 }))]
    #[case("bytes=-50", RangeOutcome::Partial(ByteRange { start: 150, end: 199 }))]
    #[case("bytes=-500", RangeOutcome::Partial(ByteRange { start: 0, end: 199 }))]
    #[case("bytes=500-600", RangeOutcome::Unsatisfiable)]
    #[case("bytes=200-", RangeOutcome::Unsatisfiable)]
    #[case("bytes=-0", RangeOutcome::Unsatisfiable)]
    #[case("bytes=0-9,20-29", RangeOutcome::Full)]
    #[case("bytes=9-0", RangeOutcome::Full)]
    #[case("items=0-9", RangeOutcome::Full)]
    #[case("bytes=abc", RangeOutcome::Full)]
    #[case("bytes=-", RangeOutcome::Full)]
    fn test_evaluate(#[case] header: &str, #[case] expected: RangeOutcome) {
        assert_eq!(evaluate(Some(header), 200), expected);
    }

    #[test]
    fn test_absent_header_is_full() {
        assert_eq!(evaluate(None, 200), RangeOutcome::Full);
        assert_eq!(evaluate(Some("bytes=-10"), 0), RangeOutcome::Full);
    }

    #[test]
    fn test_content_range_values() {
        let range = ByteRange { start: 0, end: 99 };
        assert_eq!(range.byte_count(), 100);
        assert_eq!(range.content_range(200), "bytes 0-99/200");
        assert_eq!(unsatisfiable_content_range(200), "bytes */200");
    }
}
