//! Utility functions for minidoc

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Percent-encoding set for query values (tags, document ids)
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&')
    .add(b'=')
    .add(b'+');

/// Encode a value for embedding in a url query string
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

/// Strip trailing slashes so node urls join cleanly with command paths
pub fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
