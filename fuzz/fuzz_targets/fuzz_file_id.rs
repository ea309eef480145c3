//! Fuzz target: `FileId` encode and decode.
//!
//! Any UTF-8 name must survive an encode/decode round trip, and decoding an
//! arbitrary path segment must fail cleanly instead of panicking.

#![no_main]

use gatehouse_core::FileId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let url_safe = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'=');
    let id = FileId::encode(text);
    assert!(
        id.as_str().bytes().all(url_safe),
        "encoded id must be URL safe: {id}"
    );
    assert_eq!(id.decode().ok().as_deref(), Some(text));

    let _ = FileId::from(text.to_owned()).decode();
});
