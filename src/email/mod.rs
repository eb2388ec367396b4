pub mod common;
pub mod provider;

// Re-export commonly used items
pub use common::{decode_message, MailMessage};
pub use provider::MailProvider;
