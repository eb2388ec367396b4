use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use log::{debug, error, info, warn};

use crate::cards::{normalize_name, CatalogResolver, IdentifierExtractor, LookupProvider, ResolvedItem};
use crate::config::PollConfig;
use crate::email::{decode_message, MailMessage, MailProvider};
use crate::error::{MailError, PersistenceError};
use crate::output_writer::{render_summary, CountersDocument, OutputSink};
use crate::state::{IngestState, Repository};

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The listing call failed; nothing was changed or written.
    ListingFailed,
    /// The mailbox dropped mid-cycle; what was handled before was kept.
    ConnectionLost,
}

/// Result of one polling pass
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub messages_seen: usize,
    pub messages_failed: usize,
    pub orders_matched: usize,
    pub items_resolved: usize,
    pub newest_batch: Vec<ResolvedItem>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        CycleReport {
            outcome,
            messages_seen: 0,
            messages_failed: 0,
            orders_matched: 0,
            items_resolved: 0,
            newest_batch: Vec::new(),
        }
    }
}

/// Items of the most recent order seen in the current cycle.
struct NewestBatch {
    date: Option<DateTime<Utc>>,
    items: Vec<ResolvedItem>,
}

impl NewestBatch {
    fn offer(&mut self, date: DateTime<Utc>, items: &[ResolvedItem]) {
        // strictly later only: on equal dates the first message found stays
        if items.is_empty() || self.date.is_some_and(|newest| date <= newest) {
            return;
        }
        self.date = Some(date);
        self.items = items.to_vec();
    }
}

/// One fetch → filter → extract → resolve → persist pass over the mailbox.
///
/// Owns the ingestion state for the life of the process; it is loaded from the
/// repository once and saved at the end of every cycle that got past listing.
pub struct PollCycle<L: LookupProvider, R: Repository, O: OutputSink> {
    config: PollConfig,
    resolver: CatalogResolver<L>,
    repository: R,
    output: O,
    state: IngestState,
}

impl<L: LookupProvider, R: Repository, O: OutputSink> PollCycle<L, R, O> {
    /// Fails when the stored state exists but is unusable, so that a damaged
    /// cache is never overwritten with an empty one.
    pub fn new(config: PollConfig, lookup: L, repository: R, output: O) -> Result<Self, PersistenceError> {
        let state = repository.load()?;
        info!("Poll cycle ready, resuming after UID {}", state.cursor.last_position);

        Ok(PollCycle {
            config,
            resolver: CatalogResolver::new(lookup),
            repository,
            output,
            state,
        })
    }

    pub fn state(&self) -> &IngestState {
        &self.state
    }

    pub async fn run<M: MailProvider>(&mut self, mail: &mut M, now: DateTime<Local>) -> CycleReport {
        let today = now.date_naive();
        let since = today - Duration::days(i64::from(self.config.lookback_days));

        // FETCHING
        let positions = match mail.list_messages_since(self.state.cursor.last_position, since).await {
            Ok(positions) => positions,
            Err(e) => {
                error!("❌ Unable to list messages: {}", e);
                return CycleReport::new(CycleOutcome::ListingFailed);
            }
        };

        let mut report = CycleReport::new(CycleOutcome::Completed);
        let mut newest = NewestBatch { date: None, items: Vec::new() };

        for position in positions {
            report.messages_seen += 1;

            let raw = match mail.fetch(position).await {
                Ok(raw) => raw,
                Err(MailError::Connection(reason)) => {
                    error!("❌ Mailbox connection lost at UID {}: {}", position, reason);
                    report.outcome = CycleOutcome::ConnectionLost;
                    break;
                }
                Err(e) => {
                    warn!("⚠️  Skipping message: {}", e);
                    report.messages_failed += 1;
                    self.state.cursor.mark_seen(position);
                    continue;
                }
            };

            let message = match decode_message(position, &raw) {
                Ok(message) => message,
                Err(e) => {
                    warn!("⚠️  Skipping message: {}", e);
                    report.messages_failed += 1;
                    self.state.cursor.mark_seen(position);
                    continue;
                }
            };

            self.process_message(&message, today, &mut report, &mut newest).await;
        }

        report.newest_batch = newest.items;

        // PERSISTING
        self.persist(now, &report.newest_batch);

        info!("✅ Cycle finished: {} message(s), {} order(s), {} card(s), {} failure(s)",
              report.messages_seen, report.orders_matched, report.items_resolved, report.messages_failed);

        report
    }

    async fn process_message(
        &mut self,
        message: &MailMessage,
        today: NaiveDate,
        report: &mut CycleReport,
        newest: &mut NewestBatch,
    ) {
        // FILTERING
        let matches = message.subject_contains(&self.config.subject_phrase);
        let message_date = message.date.with_timezone(&Local).date_naive();

        if !matches {
            debug!("UID {} ignored, subject '{}' does not match", message.position, message.subject);
            self.state.cursor.advance(message.position, message_date, false, today);
            return;
        }

        info!("🛒 Order found in UID {}: {}", message.position, message.subject);

        // EXTRACTING + RESOLVING
        let extractor = IdentifierExtractor::from_body(&message.body);
        let mut items = Vec::new();

        for candidate in extractor.candidates() {
            let name = normalize_name(&candidate.raw_name);
            let number = candidate.normalized_number();
            debug!("Candidate '{}' -> '{}' ({} {})", candidate.raw_name, name, candidate.set_code, number);

            if name.is_empty() {
                continue;
            }

            if let Some(item) = self.resolver.resolve(&name, &number, Some(candidate.set_code.as_str())).await {
                items.push(item);
            }
        }

        if items.is_empty() {
            warn!("⚠️  No card resolved in UID {}", message.position);
        }

        self.state.cursor.advance(message.position, message_date, true, today);
        self.state.store.record(&items);

        report.orders_matched += 1;
        report.items_resolved += items.len();
        newest.offer(message.date, &items);
    }

    /// Saves the state and writes every output document. Failures are logged
    /// and leave the in-memory state as it is.
    fn persist(&self, now: DateTime<Local>, newest_batch: &[ResolvedItem]) {
        let cursor = &self.state.cursor;
        let store = &self.state.store;

        if let Err(e) = self.repository.save(&self.state) {
            error!("❌ Unable to save cache: {}", e);
        }

        let counters = CountersDocument::new(cursor.order_count, cursor.today_count_on(now.date_naive()), now);
        if let Err(e) = self.output.write_counters(&counters) {
            error!("❌ Unable to write order counters: {}", e);
        }

        if let Err(e) = self.output.write_newest_batch(newest_batch) {
            error!("❌ Unable to write latest order cards: {}", e);
        }

        if let Err(e) = self.output.write_all_items(&store.all_items) {
            error!("❌ Unable to write all cards: {}", e);
        }

        let summary = render_summary(store, self.config.summary_top_n);
        if let Err(e) = self.output.write_summary(&summary) {
            error!("❌ Unable to write summary: {}", e);
        }
    }
}
