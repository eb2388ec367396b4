use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Mailbox position and order counters carried across polling cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionCursor {
    /// Highest message UID already handled. Never decreases.
    pub last_position: u32,
    pub order_count: u64,
    pub today_count: u64,
    pub today_date: Option<NaiveDate>,
}

impl IngestionCursor {
    /// Records one handled message.
    ///
    /// Non-matching messages only move the position. A matching message bumps
    /// the total, resets the daily counter first if the day changed, then
    /// bumps the daily counter when the message itself is from today.
    pub fn advance(
        &mut self,
        message_position: u32,
        message_date: NaiveDate,
        subject_matches: bool,
        current_date: NaiveDate,
    ) {
        if subject_matches {
            self.order_count += 1;

            if self.today_date != Some(current_date) {
                debug!("New day {}: resetting daily order counter", current_date);
                self.today_date = Some(current_date);
                self.today_count = 0;
            }

            if message_date == current_date {
                self.today_count += 1;
            }
        }

        self.mark_seen(message_position);
    }

    /// Moves past a message without touching any counter.
    pub fn mark_seen(&mut self, message_position: u32) {
        self.last_position = self.last_position.max(message_position);
    }

    /// Daily counter as it reads on `current_date` (zero once the day is over).
    pub fn today_count_on(&self, current_date: NaiveDate) -> u64 {
        if self.today_date == Some(current_date) {
            self.today_count
        } else {
            0
        }
    }
}
