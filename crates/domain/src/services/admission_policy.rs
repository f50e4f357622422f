//! Admission policy: registration-window and capacity decisions.
//!
//! Pure functions over an event snapshot and a live confirmed count. The
//! caller is responsible for reading the count under the event row lock so
//! the decision and the mutation are atomic.

use chrono::{DateTime, Utc};

use crate::models::event::{Event, EventStatus};

/// Where a new registration lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionSlot {
    /// A seat is available (subject to payment for paid events).
    Seat,
    /// Event is at capacity; enqueue at this waitlist position.
    Waitlist { position: i32 },
    /// Event is at capacity and has no waitlist.
    Full,
}

/// Whether the event currently accepts registrations.
pub fn registration_open(event: &Event, now: DateTime<Utc>) -> bool {
    if event.status != EventStatus::Published {
        return false;
    }
    if let Some(opens) = event.registration_opens_at {
        if now < opens {
            return false;
        }
    }
    if let Some(closes) = event.registration_closes_at {
        if now > closes {
            return false;
        }
    }
    // Registrations close once the event has started.
    now < event.starts_at
}

/// Decides the slot for a new registration given the live confirmed count
/// and the highest existing waitlist position.
pub fn decide_slot(event: &Event, confirmed_count: i64, max_position: Option<i32>) -> AdmissionSlot {
    match event.max_attendees {
        Some(max) if confirmed_count >= i64::from(max) => {
            if event.waitlist_enabled {
                AdmissionSlot::Waitlist {
                    position: max_position.unwrap_or(0) + 1,
                }
            } else {
                AdmissionSlot::Full
            }
        }
        _ => AdmissionSlot::Seat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Test".to_string(),
            description: None,
            status: EventStatus::Published,
            price: 0,
            currency: "USD".to_string(),
            max_attendees: Some(2),
            waitlist_enabled: false,
            registration_opens_at: None,
            registration_closes_at: None,
            starts_at: now + Duration::days(7),
            meeting_id: None,
            confirmed_count: 0,
            waitlisted_count: 0,
            attended_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_for_published_event() {
        assert!(registration_open(&event(), Utc::now()));
    }

    #[test]
    fn test_closed_for_draft() {
        let mut ev = event();
        ev.status = EventStatus::Draft;
        assert!(!registration_open(&ev, Utc::now()));
    }

    #[test]
    fn test_closed_before_window_opens() {
        let mut ev = event();
        ev.registration_opens_at = Some(Utc::now() + Duration::hours(1));
        assert!(!registration_open(&ev, Utc::now()));
    }

    #[test]
    fn test_closed_after_window_closes() {
        let mut ev = event();
        ev.registration_closes_at = Some(Utc::now() - Duration::hours(1));
        assert!(!registration_open(&ev, Utc::now()));
    }

    #[test]
    fn test_closed_once_event_started() {
        let mut ev = event();
        ev.starts_at = Utc::now() - Duration::minutes(1);
        assert!(!registration_open(&ev, Utc::now()));
    }

    #[test]
    fn test_seat_below_capacity() {
        assert_eq!(decide_slot(&event(), 1, None), AdmissionSlot::Seat);
    }

    #[test]
    fn test_full_at_capacity_without_waitlist() {
        assert_eq!(decide_slot(&event(), 2, None), AdmissionSlot::Full);
    }

    #[test]
    fn test_waitlist_at_capacity() {
        let mut ev = event();
        ev.waitlist_enabled = true;
        assert_eq!(
            decide_slot(&ev, 2, None),
            AdmissionSlot::Waitlist { position: 1 }
        );
        assert_eq!(
            decide_slot(&ev, 2, Some(4)),
            AdmissionSlot::Waitlist { position: 5 }
        );
    }

    #[test]
    fn test_unbounded_capacity() {
        let mut ev = event();
        ev.max_attendees = None;
        assert_eq!(decide_slot(&ev, 1_000_000, None), AdmissionSlot::Seat);
    }
}
