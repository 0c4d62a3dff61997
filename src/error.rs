use thiserror::Error;

/// Errors produced by the segmentation pipeline.
///
/// Every variant carries the stage and the offending value so the caller can
/// log the failure and reject the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentationError {
    /// The byte buffer does not hold exactly `width * height * 4` samples.
    #[error(
        "decode: buffer of {actual} bytes does not match {width}x{height} RGBA8 (expected {expected})"
    )]
    Decode {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },

    /// One of the declared dimensions is zero.
    #[error("decode: image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The automatic threshold is undefined because the analysis channel is constant.
    #[error("{stage}: analysis channel is constant ({value}), threshold is undefined")]
    DegenerateInput { stage: &'static str, value: u8 },

    /// A configuration value is out of its allowed range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// An internal invariant was broken. Always a bug, never recoverable.
    #[error("{stage}: invariant violated: {detail}")]
    InvariantViolation { stage: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
