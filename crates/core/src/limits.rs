//! Batch size limits and validation.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Hard ceiling on items per batch to keep a single job from monopolizing
/// the generation backend.
pub const MAX_BATCH_SIZE: u32 = 1000;

/// A batch must produce at least one item.
pub const MIN_BATCH_SIZE: u32 = 1;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a requested item count against the configured ceiling.
///
/// `max` is passed in rather than read from [`MAX_BATCH_SIZE`] directly so
/// deployments can configure a lower ceiling; callers clamp their configured
/// value to the hard maximum.
pub fn validate_batch_size(count: u32, max: u32) -> Result<(), CoreError> {
    if count < MIN_BATCH_SIZE {
        return Err(CoreError::Validation(format!(
            "Batch must contain at least {MIN_BATCH_SIZE} item(s)"
        )));
    }
    if count > max {
        return Err(CoreError::Validation(format!(
            "Batch size {count} exceeds the maximum of {max}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
