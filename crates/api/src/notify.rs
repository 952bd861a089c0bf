//! # Booking Notifications
//!
//! Confirmation delivery (guest + owner mail with an ICS invite) sits behind
//! the `Notifier` trait so transports can be swapped without touching the
//! reservation handler. Delivery is best-effort throughout: the handler logs
//! failures and never lets them affect a committed booking.

pub mod ics;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;

/// Everything a transport needs to confirm one booking to both parties.
#[derive(Debug, Clone)]
pub struct BookingNotification {
    pub guest_name: String,
    pub guest_email: String,
    pub owner_name: String,
    pub owner_email: String,
    pub meeting_type_slug: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub cancel_url: String,
    pub ics: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, notification: &BookingNotification) -> Result<()>;
}

/// Default transport: writes confirmations to the log. Wiring in SMTP or
/// another delivery channel means implementing `Notifier` and swapping it
/// into `ApiState`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_confirmed(&self, notification: &BookingNotification) -> Result<()> {
        tracing::info!(
            "Booking confirmed: {} <{}> with {} ({}) at {} (cancel: {})",
            notification.guest_name,
            notification.guest_email,
            notification.owner_name,
            notification.meeting_type_slug,
            notification.starts_at,
            notification.cancel_url,
        );
        Ok(())
    }
}
