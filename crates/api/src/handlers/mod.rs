pub mod availability;
pub mod booking;
pub mod slots;

/// Guests may not book a slot starting sooner than this many minutes from
/// now. Applied on the listing path and re-checked at commit time.
pub const LEAD_TIME_MINUTES: i64 = 15;
