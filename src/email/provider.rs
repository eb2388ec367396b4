use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::MailError;

/// A mailbox that hands out messages by monotonically increasing position.
#[async_trait]
pub trait MailProvider: Send {
    /// Positions strictly greater than `after`, received on or after `since`,
    /// in ascending order.
    async fn list_messages_since(&mut self, after: u32, since: NaiveDate) -> Result<Vec<u32>, MailError>;

    /// Raw RFC 822 content of the message at `position`.
    async fn fetch(&mut self, position: u32) -> Result<Vec<u8>, MailError>;
}
