use thiserror::Error;

/// Top-level error type for the `ted-ecc` crate.
///
/// Covers every failure mode of a session with an Energy Control Center:
/// caller mistakes detectable before any I/O, malformed device responses,
/// and transport failures (which propagate unchanged -- no retries happen
/// at this layer).
#[derive(Debug, Error)]
pub enum Error {
    // ── Usage (pre-I/O) ─────────────────────────────────────────────
    /// An interval token that is not one of seconds/minutes/hours/days/months.
    #[error("invalid interval: {token:?}")]
    InvalidInterval { token: String },

    /// Mutually exclusive history-query options were combined.
    #[error("conflicting history options: {message}")]
    ConflictingOptions { message: &'static str },

    /// A nonzero record offset was requested at a granularity coarser
    /// than seconds; the device only supports offsets for seconds data.
    #[error("record offsets are only supported at seconds granularity")]
    OffsetRequiresSeconds,

    /// Spyder groups have no seconds-granularity history on the device.
    #[error("seconds granularity is not available for spyder groups")]
    SecondsNotSupportedForGroups,

    // ── Format / protocol ───────────────────────────────────────────
    /// The device returned a document that is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// An expected XML element was absent.
    #[error("missing expected element <{element}>")]
    MissingElement { element: &'static str },

    /// An XML element held text that failed to parse as the expected type.
    #[error("invalid value {value:?} in <{element}>")]
    InvalidField { element: &'static str, value: String },

    /// A spyder's `MTUParent` pointed outside the MTU list.
    #[error("spyder references MTU {parent} but only {count} MTUs are defined")]
    MtuParentOutOfRange { parent: usize, count: usize },

    /// The history export stream was not valid CSV.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// An export row had too few fields.
    #[error("export row has {found} fields, expected 4")]
    ShortExportRow { found: usize },

    /// A raw history line was not valid Base64.
    #[error("invalid Base64 in raw history line: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A raw record did not start with the 0xA4 marker byte.
    #[error("unexpected record marker 0x{found:02x} (want 0xa4)")]
    BadMarker { found: u8 },

    /// A raw record's trailing checksum did not match its contents.
    #[error("record checksum mismatch: computed 0x{computed:02x}, found 0x{found:02x}")]
    ChecksumMismatch { computed: u8, found: u8 },

    /// A raw record's length did not match its layout.
    #[error("raw record has {found} bytes, layout requires {expected}")]
    BadRecordLength { expected: usize, found: usize },

    /// A timestamp field failed to parse.
    #[error("unparseable timestamp {value:?}")]
    BadTimestamp { value: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The device answered with a non-success HTTP status.
    #[error("device returned HTTP {status}")]
    Status { status: u16 },
}

impl Error {
    /// Returns `true` for caller mistakes caught before any request is sent.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidInterval { .. }
                | Self::ConflictingOptions { .. }
                | Self::OffsetRequiresSeconds
                | Self::SecondsNotSupportedForGroups
        )
    }

    /// Returns `true` if the device's response did not match the expected shape.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Xml(_)
                | Self::MissingElement { .. }
                | Self::InvalidField { .. }
                | Self::MtuParentOutOfRange { .. }
                | Self::Csv(_)
                | Self::ShortExportRow { .. }
                | Self::Base64(_)
                | Self::BadMarker { .. }
                | Self::ChecksumMismatch { .. }
                | Self::BadRecordLength { .. }
                | Self::BadTimestamp { .. }
        )
    }
}
