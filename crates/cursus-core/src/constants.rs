//! Application-wide constants.

/// Upper bound for a lesson video payload (512 MiB).
pub const VIDEO_MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Upper bound for a lesson document payload (20 MiB).
pub const DOCUMENT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Lesson videos are ingested as MP4 only; transcoding other containers is a
/// client-side concern.
pub const VIDEO_ALLOWED_CONTENT_TYPES: &[&str] = &["video/mp4"];

pub const VIDEO_ALLOWED_EXTENSIONS: &[&str] = &["mp4"];

pub const DOCUMENT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "image/jpeg",
    "image/png",
];

pub const DOCUMENT_ALLOWED_EXTENSIONS: &[&str] =
    &["pdf", "doc", "docx", "ppt", "pptx", "jpg", "jpeg", "png"];

/// Staged files older than this are fair game for the periodic janitor sweep.
/// Must stay well above the longest plausible in-flight transfer; the age
/// threshold is the only thing keeping the sweep away from active uploads.
pub const STAGED_FILE_MAX_AGE_SECS: u64 = 2 * 60 * 60;

/// Interval between periodic janitor sweeps.
pub const JANITOR_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
