//! Fuzz target: page generation for arbitrary offsets and page sizes.
//!
//! Page sizes are bounded to keep each run fast; offsets are not.

#![no_main]

use gatehouse_core::{FileCatalog, PageRequest, TimestampMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let mut offset = [0u8; 8];
    offset.copy_from_slice(&data[..8]);
    let offset = u64::from_le_bytes(offset);
    let page_size = u64::from(u16::from_le_bytes([data[8], data[9]]));
    let filter = String::from_utf8_lossy(&data[10..]);

    let catalog = FileCatalog::default();
    let request = PageRequest::new(offset, page_size, filter.to_string());
    let page = catalog.list(&request, TimestampMode::Fixed);

    assert!(
        page.records.len() as u64 <= page_size,
        "page must never exceed its size"
    );
    let mut ids: Vec<&str> = page.records.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(
        ids.len(),
        page.records.len(),
        "ids must be unique within a page"
    );
    if let Some(next) = page.next {
        assert!(next.offset < catalog.file_limit());
        assert_eq!(next.filter, filter);
    }
});
