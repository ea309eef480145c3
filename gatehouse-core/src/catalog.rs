//! Synthetic file catalog.
//!
//! The catalog holds no files. Each page is generated on demand by splitting
//! the requested page size across a weighted table of file-type buckets, so
//! the same `(offset, page_size)` always yields the same names and ids.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::FileId;

/// Page size used when a listing request does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Hard ceiling on the number of files the catalog pretends to hold.
pub const FILE_LIMIT: u64 = 50_000;

/// Default bucket table as `(name, weight_percent)`, in emission order.
pub const DEFAULT_BUCKETS: [(&str, u32); 6] = [
    ("150_kb.pdf", 20),
    ("500_kb.pdf", 20),
    ("1_mb.pdf", 20),
    ("5_mb.pdf", 20),
    ("10_mb.pdf", 15),
    ("100_mb.pdf", 5),
];

/// Placeholder document every record links to as its external URL.
pub const EXTERNAL_URL: &str =
    "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf";

/// MIME type reported for PDF buckets and for all metadata lookups.
pub const PDF_MIME_TYPE: &str = "application/pdf";

const TEXT_MIME_TYPE: &str = "text/plain";
const FIXED_LAST_MODIFIED: &str = "2023-04-17T12:34:56Z";
const FIXED_CREATED: &str = "2023-01-01T00:00:00Z";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One weighted file-type category of the synthetic catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Bucket {
    /// File name suffix shared by every record in this bucket (e.g. `"1_mb.pdf"`).
    pub name: String,
    /// Share of each page, in whole percent.
    pub weight_percent: u32,
}

impl Bucket {
    /// Creates a bucket.
    pub fn new(name: impl Into<String>, weight_percent: u32) -> Self {
        Self {
            name: name.into(),
            weight_percent,
        }
    }

    /// MIME type advertised for records generated from this bucket.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        if self.name.ends_with(".pdf") {
            PDF_MIME_TYPE
        } else {
            TEXT_MIME_TYPE
        }
    }

    /// Number of records this bucket contributes to a page of `page_size`.
    ///
    /// `floor(page_size * weight / 100)`, computed without rounding error.
    #[must_use]
    pub fn count_for(&self, page_size: u64) -> u64 {
        let exact = u128::from(page_size) * u128::from(self.weight_percent) / 100;
        u64::try_from(exact).unwrap_or(u64::MAX)
    }
}

/// How record timestamps are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TimestampMode {
    /// Fixed dates, so repeated listings are byte-identical.
    #[default]
    Fixed,
    /// Wall-clock UTC time at the moment the page is built.
    Now,
}

impl TimestampMode {
    /// Returns `(last_modified, created)` in wire format.
    #[must_use]
    pub fn stamps(self) -> (String, String) {
        match self {
            TimestampMode::Fixed => (FIXED_LAST_MODIFIED.to_owned(), FIXED_CREATED.to_owned()),
            TimestampMode::Now => {
                let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
                (now.clone(), now)
            }
        }
    }
}

/// Lifecycle status of a catalog record. Every synthetic file is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum FileStatus {
    Active,
}

/// Download location and type of a record's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FileContent {
    /// Path relative to the files collection, `"{id}/download"`.
    pub download_path: String,
    pub mime_type: String,
}

/// One entry of the file catalog as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FileRecord {
    pub id: FileId,
    pub name: String,
    pub status: FileStatus,
    pub last_modified_datetime: String,
    pub created_datetime: String,
    pub content: FileContent,
    pub external_url: String,
}

impl FileRecord {
    /// Builds the record for `name`, deriving its id from the name.
    #[must_use]
    pub fn for_name(name: String, mime_type: &str, timestamps: TimestampMode) -> Self {
        let (last_modified, created) = timestamps.stamps();
        Self::with_stamps(name, mime_type, last_modified, created)
    }

    fn with_stamps(name: String, mime_type: &str, last_modified: String, created: String) -> Self {
        let id = FileId::encode(&name);
        Self {
            content: FileContent {
                download_path: format!("{id}/download"),
                mime_type: mime_type.to_owned(),
            },
            id,
            name,
            status: FileStatus::Active,
            last_modified_datetime: last_modified,
            created_datetime: created,
            external_url: EXTERNAL_URL.to_owned(),
        }
    }
}

/// Parameters of one page of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PageRequest {
    /// Number of records preceding this page in the walk.
    pub offset: u64,
    pub page_size: u64,
    /// Opaque filter expression. Carried into continuation links, never applied.
    pub filter: String,
}

impl PageRequest {
    /// Creates a page request.
    pub fn new(offset: u64, page_size: u64, filter: impl Into<String>) -> Self {
        Self {
            offset,
            page_size,
            filter: filter.into(),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, String::new())
    }
}

/// A generated page and the request for the page after it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct FilePage {
    pub records: Vec<FileRecord>,
    pub next: Option<PageRequest>,
}

/// The weighted bucket table plus the catalog ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCatalog {
    buckets: Vec<Bucket>,
    file_limit: u64,
}

impl FileCatalog {
    /// Creates a catalog over `buckets`, emitted in the given order.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBucketTable`] if `buckets` is empty or the
    /// weights do not add up to exactly 100.
    pub fn new(buckets: Vec<Bucket>, file_limit: u64) -> Result<Self, CoreError> {
        if buckets.is_empty() {
            return Err(CoreError::InvalidBucketTable {
                reason: "no buckets".to_owned(),
            });
        }
        let total: u64 = buckets.iter().map(|b| u64::from(b.weight_percent)).sum();
        if total != 100 {
            return Err(CoreError::InvalidBucketTable {
                reason: format!("weights sum to {total}, expected 100"),
            });
        }
        Ok(Self {
            buckets,
            file_limit,
        })
    }

    /// Creates a catalog over the default bucket table with a custom ceiling.
    #[must_use]
    pub fn with_file_limit(file_limit: u64) -> Self {
        Self {
            file_limit,
            ..Self::default()
        }
    }

    /// Buckets in emission order.
    #[must_use]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Ceiling past which no continuation link is produced.
    #[must_use]
    pub fn file_limit(&self) -> u64 {
        self.file_limit
    }

    /// Per-bucket record counts for a page of `page_size`.
    ///
    /// The counts may add up to less than `page_size`; the shortfall is the
    /// sum of the truncated fractional parts.
    #[must_use]
    pub fn bucket_counts(&self, page_size: u64) -> Vec<(&Bucket, u64)> {
        self.buckets
            .iter()
            .map(|b| (b, b.count_for(page_size)))
            .collect()
    }

    /// Generates one page of the listing.
    ///
    /// Records are grouped by bucket in table order and numbered
    /// sequentially from `offset + 1`. The page size is capped at the file
    /// limit. Numbering is not bounded by `u64`, so a page starting near
    /// `u64::MAX` still carries distinct names.
    #[must_use]
    pub fn list(&self, request: &PageRequest, timestamps: TimestampMode) -> FilePage {
        let page_size = request.page_size.min(self.file_limit);
        let counts = self.bucket_counts(page_size);
        let total = counts.iter().map(|(_, n)| *n).sum::<u64>();
        let (last_modified, created) = timestamps.stamps();

        let mut records = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut index = u128::from(request.offset) + 1;
        for (bucket, count) in counts {
            for _ in 0..count {
                records.push(FileRecord::with_stamps(
                    format!("{index}_{}", bucket.name),
                    bucket.mime_type(),
                    last_modified.clone(),
                    created.clone(),
                ));
                index += 1;
            }
        }

        let end = request.offset.saturating_add(page_size);
        let new_offset = end.min(self.file_limit);
        let next = if new_offset < self.file_limit {
            let filter = request.filter.clone();
            Some(PageRequest::new(new_offset, page_size, filter))
        } else {
            None
        };

        FilePage { records, next }
    }
}

impl Default for FileCatalog {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS
                .iter()
                .map(|(name, w)| Bucket::new(*name, *w))
                .collect(),
            file_limit: FILE_LIMIT,
        }
    }
}

/// Synthesizes metadata for an arbitrary identifier.
///
/// The literal identifier is taken as the file name; there is no lookup, so
/// every identifier resolves.
#[must_use]
pub fn metadata(file_id: &str, timestamps: TimestampMode) -> FileRecord {
    FileRecord::for_name(file_id.to_owned(), PDF_MIME_TYPE, timestamps)
}
