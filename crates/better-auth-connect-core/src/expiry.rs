// Token expiry checks. Pure functions over the wall clock; the `_at` variants
// take `now` explicitly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::account::Account;

/// Default warning window for [`is_expiring_soon`], in hours.
pub const DEFAULT_EXPIRY_WARNING_HOURS: f64 = 24.0;

const MILLIS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

/// Whether the account's access token has expired.
///
/// Accounts without an expiry timestamp never expire.
pub fn is_expired(account: &Account) -> bool {
    is_expired_at(account, Utc::now())
}

pub fn is_expired_at(account: &Account, now: DateTime<Utc>) -> bool {
    match account.access_token_expires_at {
        Some(expires_at) => expires_at <= now,
        None => false,
    }
}

/// Whether the token expires within `threshold_hours` but has not expired yet.
pub fn is_expiring_soon(account: &Account, threshold_hours: f64) -> bool {
    is_expiring_soon_at(account, threshold_hours, Utc::now())
}

pub fn is_expiring_soon_at(account: &Account, threshold_hours: f64, now: DateTime<Utc>) -> bool {
    let Some(expires_at) = account.access_token_expires_at else {
        return false;
    };
    let hours_until_expiry = (expires_at - now).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    hours_until_expiry > 0.0 && hours_until_expiry < threshold_hours
}

/// Coarse classification of an account's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenStatus {
    /// No expiry recorded (API keys, long-lived tokens).
    NoExpiry,
    Valid,
    ExpiringSoon,
    Expired,
}

pub fn token_status(account: &Account, threshold_hours: f64) -> TokenStatus {
    token_status_at(account, threshold_hours, Utc::now())
}

pub fn token_status_at(account: &Account, threshold_hours: f64, now: DateTime<Utc>) -> TokenStatus {
    if account.access_token_expires_at.is_none() {
        TokenStatus::NoExpiry
    } else if is_expired_at(account, now) {
        TokenStatus::Expired
    } else if is_expiring_soon_at(account, threshold_hours, now) {
        TokenStatus::ExpiringSoon
    } else {
        TokenStatus::Valid
    }
}

/// Human-readable time left until `expires_at`: `Expired`, `2d 3h`, `4h 5m`
/// or `6m`. `None` when there is no expiry.
pub fn time_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let expires_at = expires_at?;
    let remaining = (expires_at - now).num_milliseconds();
    if remaining <= 0 {
        return Some("Expired".to_string());
    }

    let minutes_total = remaining / (1000 * 60);
    let days = minutes_total / (60 * 24);
    let hours = (minutes_total / 60) % 24;
    let minutes = minutes_total % 60;

    Some(if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    })
}
