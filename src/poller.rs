//! Order watermark poller
//!
//! Periodically reads orders updated after the last seen `updatedAt` value and
//! posts a notification for every order whose status is important.
//!
//! The watermark advances row by row. A failed notification aborts the cycle
//! before the watermark moves past the failing row, so that row is retried on
//! the next cycle. Rows already advanced past are never revisited. Rows between
//! the last advanced one and the failure may be notified twice.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::types::ChatId;
use tracing::{debug, error, info, warn, Instrument};

use crate::channel::OutboundChannel;
use crate::db::OrderSource;
use crate::errors::{AppError, AppResult};
use crate::language::Language;
use crate::localization::LocalizationManager;
use crate::observability;
use crate::orders::format_order_notification;

/// Monotonic cursor over order update timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark(Option<DateTime<Utc>>);

impl Watermark {
    pub fn new(value: Option<DateTime<Utc>>) -> Self {
        Self(value)
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_initialized(&self) -> bool {
        self.0.is_some()
    }

    /// Move the watermark to `ts` if that is later than the current value.
    /// Returns whether it moved.
    pub fn advance(&mut self, ts: DateTime<Utc>) -> bool {
        match self.0 {
            Some(current) if current >= ts => false,
            _ => {
                self.0 = Some(ts);
                true
            }
        }
    }
}

/// What a poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The watermark was set from the latest update in the database
    Initialized { watermark: DateTime<Utc> },
    /// The database has no orders yet, so initialization is deferred
    Deferred,
    /// Updated orders were processed
    Processed { notified: usize, skipped: usize },
}

/// Polls an [`OrderSource`] and posts notifications through an [`OutboundChannel`]
pub struct OrderPoller<S, C> {
    source: S,
    channel: Arc<C>,
    localization: Arc<LocalizationManager>,
    language: Language,
    chat_id: ChatId,
    watermark: Watermark,
    cycles: u64,
}

impl<S: OrderSource, C: OutboundChannel> OrderPoller<S, C> {
    pub fn new(
        source: S,
        channel: Arc<C>,
        localization: Arc<LocalizationManager>,
        chat_id: ChatId,
    ) -> Self {
        Self {
            source,
            channel,
            localization,
            language: Language::En,
            chat_id,
            watermark: Watermark::default(),
            cycles: 0,
        }
    }

    /// Language of the notification labels (English by default)
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Run one poll cycle.
    ///
    /// On error the watermark keeps whatever value it reached before the failure.
    pub async fn run_cycle(&mut self) -> AppResult<CycleReport> {
        self.cycles += 1;
        let span = observability::poller_span(self.cycles);
        let start_time = Instant::now();

        let result = self.poll_once().instrument(span).await;

        observability::record_poll_cycle(result.is_ok(), start_time.elapsed());
        if let Some(watermark) = self.watermark.get() {
            observability::update_watermark(watermark);
        }
        result
    }

    async fn poll_once(&mut self) -> AppResult<CycleReport> {
        let Some(since) = self.watermark.get() else {
            return match self.source.latest_update().await? {
                Some(latest) => {
                    self.watermark.advance(latest);
                    info!(watermark = %latest, "Order watermark initialized");
                    Ok(CycleReport::Initialized { watermark: latest })
                }
                None => {
                    debug!("No orders yet, watermark stays uninitialized");
                    Ok(CycleReport::Deferred)
                }
            };
        };

        let orders = self.source.updated_since(since).await?;
        let mut notified = 0;
        let mut skipped = 0;

        for order in orders {
            if order.status.is_important() {
                let text = format_order_notification(&order, &self.localization, self.language);
                if let Err(e) = self.channel.send_text(self.chat_id, &text).await {
                    warn!(
                        order_number = %order.order_number,
                        status = %order.status,
                        error = %e,
                        "Order notification failed, aborting cycle"
                    );
                    return Err(AppError::from(e));
                }
                observability::record_order_notification(order.status.as_str());
                info!(
                    order_number = %order.order_number,
                    status = %order.status,
                    "Order notification sent"
                );
                notified += 1;
            } else {
                skipped += 1;
            }
            self.watermark.advance(order.updated_at);
        }

        Ok(CycleReport::Processed { notified, skipped })
    }

    /// Poll forever: wait `initial_delay`, then run a cycle every `interval`.
    /// Cycle failures are logged and the loop continues.
    pub async fn run(mut self, initial_delay: Duration, interval: Duration) {
        tokio::time::sleep(initial_delay).await;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(report) => debug!(report = ?report, "Order poll cycle finished"),
                Err(e) => error!(error = %e, cycle = self.cycles, "Order poll cycle failed"),
            }
        }
    }
}
