//! Outbound notification channels for the signal/position pipeline.
//! Directly grounded on `apps/api/src/notifications/mod.rs`'s
//! `NotificationSender` trait and channel set, moved here since
//! `spec.md` treats notifications as an external-collaborator concern
//! rather than an API-layer one; the `Alert`-shaped payload it carried
//! is replaced with `TradeSignal`/`Position`/`Campaign` construction.

mod email;
mod telegram;
mod webhook;

pub use email::{EmailConfig, EmailNotifier};
pub use telegram::{TelegramConfig, TelegramNotifier};
pub use webhook::{WebhookConfig, WebhookNotifier};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use jejakcuan_core::{Position, TradeSignal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Channel not configured: {0}")]
    NotConfigured(String),
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u64),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Network error: {0}")]
    NetworkError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Telegram,
    Email,
    Webhook,
    WebPush,
    InApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;
    fn is_configured(&self) -> bool;
    fn channel_type(&self) -> NotificationChannel;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub symbol: Option<String>,
    pub signal_id: Option<String>,
    pub position_id: Option<String>,
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    pub channel: NotificationChannel,
    pub metadata: NotificationMetadata,
}

impl Notification {
    pub fn for_new_signal(signal: &TradeSignal, recipient_id: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            title: format!("{} {:?} signal", signal.symbol, signal.pattern_type),
            body: format!(
                "Entry {} | Stop {} | R-multiple {}x | Confidence {}",
                signal.entry_price, signal.stop_loss, signal.r_multiple, signal.confidence_score
            ),
            priority: priority_for_confidence(signal.confidence_score),
            channel: NotificationChannel::InApp,
            metadata: NotificationMetadata {
                symbol: Some(signal.symbol.clone()),
                signal_id: Some(signal.id.to_string()),
                position_id: None,
                action_url: Some(format!("/signals/{}", signal.id)),
            },
        }
    }

    pub fn for_emergency_exit(position: &Position, reason: &str, recipient_id: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            title: format!("Emergency exit: {}", position.symbol),
            body: reason.to_string(),
            priority: NotificationPriority::Critical,
            channel: NotificationChannel::InApp,
            metadata: NotificationMetadata {
                symbol: Some(position.symbol.clone()),
                signal_id: None,
                position_id: Some(position.id.to_string()),
                action_url: Some(format!("/positions/{}", position.id)),
            },
        }
    }
}

fn priority_for_confidence(confidence: Decimal) -> NotificationPriority {
    if confidence >= Decimal::from(85) {
        NotificationPriority::Critical
    } else if confidence >= Decimal::from(70) {
        NotificationPriority::High
    } else if confidence >= Decimal::from(50) {
        NotificationPriority::Medium
    } else {
        NotificationPriority::Low
    }
}

/// Quiet-hours window plus a per-channel confidence floor, gating
/// `NotificationService::send` before it ever reaches a channel.
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    pub min_priority: NotificationPriority,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            quiet_hours_start: None,
            quiet_hours_end: None,
            min_priority: NotificationPriority::Low,
        }
    }
}

impl NotificationPolicy {
    fn in_quiet_hours(&self, now: NaiveTime) -> bool {
        match (self.quiet_hours_start, self.quiet_hours_end) {
            (Some(start), Some(end)) if start <= end => now >= start && now < end,
            (Some(start), Some(end)) => now >= start || now < end,
            _ => false,
        }
    }

    /// Critical notifications always bypass quiet hours -- an
    /// emergency exit must never be silently swallowed.
    fn allows(&self, notification: &Notification) -> bool {
        if notification.priority < self.min_priority {
            return false;
        }
        if notification.priority == NotificationPriority::Critical {
            return true;
        }
        !self.in_quiet_hours(Utc::now().time())
    }
}

pub struct NotificationService {
    telegram: Option<Arc<TelegramNotifier>>,
    email: Option<Arc<EmailNotifier>>,
    webhook: Option<Arc<WebhookNotifier>>,
    policy: NotificationPolicy,
}

impl NotificationService {
    pub fn new(policy: NotificationPolicy) -> Self {
        Self {
            telegram: None,
            email: None,
            webhook: None,
            policy,
        }
    }

    pub fn with_telegram(mut self, notifier: TelegramNotifier) -> Self {
        self.telegram = Some(Arc::new(notifier));
        self
    }

    pub fn with_email(mut self, notifier: EmailNotifier) -> Self {
        self.email = Some(Arc::new(notifier));
        self
    }

    pub fn with_webhook(mut self, notifier: WebhookNotifier) -> Self {
        self.webhook = Some(Arc::new(notifier));
        self
    }

    pub async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.policy.allows(notification) {
            return Ok(());
        }

        match notification.channel {
            NotificationChannel::Telegram => match &self.telegram {
                Some(sender) => sender.send(notification).await,
                None => Err(NotificationError::NotConfigured("Telegram".into())),
            },
            NotificationChannel::Email => match &self.email {
                Some(sender) => sender.send(notification).await,
                None => Err(NotificationError::NotConfigured("Email".into())),
            },
            NotificationChannel::Webhook => match &self.webhook {
                Some(sender) => sender.send(notification).await,
                None => Err(NotificationError::NotConfigured("Webhook".into())),
            },
            NotificationChannel::WebPush => Err(NotificationError::NotConfigured("WebPush".into())),
            NotificationChannel::InApp => Ok(()),
        }
    }

    pub async fn broadcast(
        &self,
        notification: &Notification,
        channels: &[NotificationChannel],
    ) -> Vec<(NotificationChannel, NotificationResult<()>)> {
        let mut results = Vec::with_capacity(channels.len());
        for channel in channels {
            let mut notif = notification.clone();
            notif.channel = *channel;
            results.push((*channel, self.send(&notif).await));
        }
        results
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(NotificationPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jejakcuan_core::{
        AssetClass, ConfidenceComponents, Phase, PatternType, PositionSizeUnit, SignalStatus,
        TargetLevels, Timeframe, ValidationChain,
    };
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn signal(confidence: Decimal) -> TradeSignal {
        TradeSignal {
            id: Uuid::new_v4(),
            asset_class: AssetClass::Stock,
            symbol: "BBCA".to_string(),
            pattern_type: PatternType::Spring,
            phase: Phase::C,
            timeframe: Timeframe::new("1d"),
            entry_price: dec!(9500),
            stop_loss: dec!(9300),
            target_levels: TargetLevels {
                primary_target: dec!(9700),
                secondary_targets: vec![dec!(9900), dec!(10100)],
                trailing_activation: None,
                trailing_offset: None,
            },
            position_size: dec!(100),
            position_size_unit: PositionSizeUnit::Shares,
            leverage: dec!(1),
            margin: dec!(0),
            notional_value: dec!(950000),
            risk_amount: dec!(20000),
            r_multiple: dec!(1.0),
            confidence_score: confidence,
            confidence_components: ConfidenceComponents {
                pattern: confidence,
                phase: confidence,
                volume: confidence,
            },
            campaign_id: None,
            status: SignalStatus::Pending,
            rejection_reasons: vec![],
            validation_chain: ValidationChain::default(),
            schema_version: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn high_confidence_signal_is_high_priority() {
        let notif = Notification::for_new_signal(&signal(dec!(75)), "user-1");
        assert_eq!(notif.priority, NotificationPriority::High);
    }

    #[test]
    fn critical_notifications_bypass_quiet_hours() {
        let policy = NotificationPolicy {
            quiet_hours_start: Some(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
            quiet_hours_end: Some(NaiveTime::from_hms_opt(23, 59, 59).unwrap()),
            min_priority: NotificationPriority::Low,
        };
        let mut notif = Notification::for_new_signal(&signal(dec!(90)), "user-1");
        notif.priority = NotificationPriority::Critical;
        assert!(policy.allows(&notif));
    }

    #[test]
    fn below_min_priority_is_suppressed() {
        let policy = NotificationPolicy {
            min_priority: NotificationPriority::High,
            ..NotificationPolicy::default()
        };
        let notif = Notification::for_new_signal(&signal(dec!(20)), "user-1");
        assert!(!policy.allows(&notif));
    }
}
