// Exit codes for scripted runs
use memstream_core::StreamError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_INVALID_CONFIG: i32 = 2;
pub const EXIT_DEVICE_FAIL: i32 = 3;
pub const EXIT_VALIDATION_FAIL: i32 = 4;

/// Pick the exit code for a failed run from the first [`StreamError`] in
/// the error chain.
pub fn code_for(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|cause| cause.downcast_ref::<StreamError>()) {
        Some(StreamError::InvalidConfiguration(_) | StreamError::InvalidDevice { .. }) => {
            EXIT_INVALID_CONFIG
        }
        Some(StreamError::TransferError { .. }) | None => EXIT_GENERIC_FAIL,
        Some(_) => EXIT_DEVICE_FAIL,
    }
}
