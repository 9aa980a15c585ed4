use thiserror::Error;

/// Errors raised while decoding or extracting a container.
#[derive(Debug, Error)]
pub enum Error {
    /// The 4-byte tag at the container's base offset is not a known magic.
    #[error("invalid container magic {found:#010x} at offset {offset:#x}")]
    InvalidMagic { offset: u64, found: u32 },

    /// The part table length is not a multiple of the record size.
    #[error("malformed part table: length {length} is not a multiple of 40")]
    MalformedFooter { length: u64 },

    /// A header field read would run past the declared header size.
    #[error("header read of {width} bytes at offset {offset} exceeds header size {limit}")]
    OutOfBounds {
        offset: usize,
        width: usize,
        limit: usize,
    },

    /// The block map or bundle manifest could not be parsed.
    #[error("malformed XML in {document}: {reason}")]
    XmlParse {
        document: &'static str,
        reason: String,
    },

    /// A part flagged as compressed is not a valid raw DEFLATE stream.
    #[error("failed to inflate {path}: {source}")]
    Inflate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A bundle lists a package stored at the bundle's own base offset.
    #[error("nested package at offset 0 of the container at {offset:#x} re-enters its bundle")]
    RecursiveContainer { offset: u64 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn xml(document: &'static str, reason: impl ToString) -> Self {
        Error::XmlParse {
            document,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
