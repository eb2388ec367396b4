use anyhow::{Context, Result};
use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::StreamExt;
use log::{debug, info};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use crate::config::ImapConfig;
use crate::email::MailProvider;
use crate::error::MailError;

pub struct ImapClient {
    session: Session<TlsStream<Compat<TcpStream>>>,
    folder: String,
}

impl ImapClient {
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        info!("📬 Connecting to IMAP server {}:{}", config.server, config.port);

        // TCP connection
        let tcp_stream = TcpStream::connect((config.server.as_str(), config.port))
            .await
            .context("Unable to reach the IMAP server")?;

        // TLS on top of it
        let tls = TlsConnector::new();
        let tls_stream = tls.connect(&config.server, tcp_stream.compat())
            .await
            .context("Unable to establish the TLS connection")?;

        let client = async_imap::Client::new(tls_stream);

        let session = client
            .login(&config.username, &config.password)
            .await
            .map_err(|e| anyhow::anyhow!("IMAP authentication failed: {:?}", e.0))?;

        info!("IMAP session established for {}", config.username);

        Ok(ImapClient {
            session,
            folder: config.folder.clone(),
        })
    }

    pub async fn logout(mut self) -> Result<()> {
        info!("Closing IMAP session");
        self.session.logout()
            .await
            .context("Error while logging out of IMAP")?;
        Ok(())
    }
}

fn classify_fetch_error(position: u32, error: async_imap::error::Error) -> MailError {
    match error {
        async_imap::error::Error::Io(e) => MailError::Connection(e.to_string()),
        async_imap::error::Error::ConnectionLost => MailError::Connection("connection lost".to_string()),
        other => MailError::Message {
            position,
            reason: other.to_string(),
        },
    }
}

/// IMAP `SINCE` takes dates as `02-Jan-2024`.
pub fn imap_since_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

#[async_trait]
impl MailProvider for ImapClient {
    async fn list_messages_since(&mut self, after: u32, since: NaiveDate) -> Result<Vec<u32>, MailError> {
        self.session.select(&self.folder)
            .await
            .map_err(|e| MailError::Listing(format!("unable to select {}: {}", self.folder, e)))?;

        let criteria = format!("SINCE {}", imap_since_date(since));
        debug!("Search criteria: {}", criteria);

        let uids = self.session
            .uid_search(&criteria)
            .await
            .map_err(|e| MailError::Listing(format!("search failed: {}", e)))?;

        let mut uids: Vec<u32> = uids.into_iter().filter(|uid| *uid > after).collect();
        uids.sort_unstable();

        info!("📬 {} new message(s) in {} after UID {}", uids.len(), self.folder, after);
        Ok(uids)
    }

    async fn fetch(&mut self, position: u32) -> Result<Vec<u8>, MailError> {
        debug!("Fetching message UID {}", position);

        let messages_stream = self.session
            .uid_fetch(position.to_string(), "RFC822")
            .await
            .map_err(|e| classify_fetch_error(position, e))?;

        let messages: Vec<_> = messages_stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify_fetch_error(position, e))?;

        let body = messages
            .iter()
            .find_map(|message| message.body())
            .ok_or_else(|| MailError::Message {
                position,
                reason: "empty fetch response".to_string(),
            })?;

        debug!("Message UID {} fetched, {} bytes", position, body.len());
        Ok(body.to_vec())
    }
}
