/// Percentage points earned per successful interaction.
pub const PROGRESS_STEP: u64 = 7;

/// Upper bound of the progress percentage.
pub const PROGRESS_CAP: u8 = 100;

/// `min(activity_count * 7, 100)`.
#[must_use]
pub fn progress_for(activity_count: u64) -> u8 {
    let raw = activity_count.saturating_mul(PROGRESS_STEP);
    // Fits in u8 after clamping.
    raw.min(u64::from(PROGRESS_CAP)) as u8
}
