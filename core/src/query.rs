//! Percent-encoding for URL path segments and query strings.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters stay literal in path segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query values additionally keep `,`, which PocketBase uses as a list
/// separator in `sort`, `expand` and `fields`.
const QUERY_VALUE: &AsciiSet = &PATH_SEGMENT.remove(b',');

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Appends `key=value` pairs to a URL, starting with `?` and continuing
/// with `&`. Keys are written verbatim; values are percent-encoded.
pub(crate) struct Query {
    url: String,
    has_params: bool,
}

impl Query {
    pub(crate) fn new(url: String) -> Self {
        Self {
            url,
            has_params: false,
        }
    }

    pub(crate) fn push(&mut self, key: &str, value: &str) -> &mut Self {
        self.url.push(if self.has_params { '&' } else { '?' });
        self.url.push_str(key);
        self.url.push('=');
        self.url.extend(utf8_percent_encode(value, QUERY_VALUE));
        self.has_params = true;
        self
    }

    pub(crate) fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub(crate) fn finish(self) -> String {
        self.url
    }
}
