//! Order snapshots read from the shop database and their notification text.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use teloxide::utils::html;

use crate::language::Language;
use crate::localization::{t_args_lang, t_lang, LocalizationManager};

/// Item lines listed before the rest is summarized, keeping notifications
/// under Telegram's 4096 chars
pub const MAX_ITEM_LINES: usize = 25;

const MAX_ITEM_NAME_CHARS: usize = 100;

/// Order workflow status as stored by the shop
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Authorized,
    Confirmed,
    PartialRefunded,
    Refunded,
    PartialReversed,
    Reversed,
    Rejected,
    DeadlineExpired,
    /// Any status this bot does not know about
    Other(String),
}

impl OrderStatus {
    /// Parse the database representation (`PARTIAL_REFUNDED`, `partial-refunded`, ...)
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "PENDING" | "NEW" => OrderStatus::Pending,
            "AUTHORIZED" => OrderStatus::Authorized,
            "CONFIRMED" => OrderStatus::Confirmed,
            "PARTIAL_REFUNDED" => OrderStatus::PartialRefunded,
            "REFUNDED" => OrderStatus::Refunded,
            "PARTIAL_REVERSED" => OrderStatus::PartialReversed,
            "REVERSED" => OrderStatus::Reversed,
            "REJECTED" => OrderStatus::Rejected,
            "DEADLINE_EXPIRED" => OrderStatus::DeadlineExpired,
            _ => OrderStatus::Other(raw.trim().to_string()),
        }
    }

    /// Statuses that trigger a notification in the team chat
    pub fn is_important(&self) -> bool {
        matches!(
            self,
            OrderStatus::Authorized
                | OrderStatus::Confirmed
                | OrderStatus::PartialRefunded
                | OrderStatus::Refunded
                | OrderStatus::PartialReversed
                | OrderStatus::Reversed
                | OrderStatus::Rejected
                | OrderStatus::DeadlineExpired
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Authorized => "AUTHORIZED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::PartialRefunded => "PARTIAL_REFUNDED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::PartialReversed => "PARTIAL_REVERSED",
            OrderStatus::Reversed => "REVERSED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::DeadlineExpired => "DEADLINE_EXPIRED",
            OrderStatus::Other(raw) => raw,
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            OrderStatus::Authorized | OrderStatus::Confirmed => "✅",
            OrderStatus::PartialRefunded
            | OrderStatus::Refunded
            | OrderStatus::PartialReversed
            | OrderStatus::Reversed => "↩️",
            OrderStatus::Rejected | OrderStatus::DeadlineExpired => "⛔",
            OrderStatus::Pending | OrderStatus::Other(_) => "ℹ️",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one order row
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub shipping_method: String,
    pub subtotal: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Value,
    pub coupons: Option<Value>,
}

impl Order {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Build the HTML notification posted for an order status change
pub fn format_order_notification(
    order: &Order,
    localization: &LocalizationManager,
    language: Language,
) -> String {
    let label = |key: &str| t_lang(localization, key, language);
    let order_number = html::escape(&order.order_number);
    let mut lines = vec![
        t_args_lang(
            localization,
            "order-title",
            &[("order_number", order_number.as_str())],
            language,
        ),
        format!(
            "{} {} <code>{}</code>",
            label("order-status"),
            order.status.emoji(),
            html::escape(order.status.as_str())
        ),
        String::new(),
        format!("{} {}", label("order-customer"), html::escape(&order.customer_name())),
        format!("{} {}", label("order-email"), html::escape(&order.email)),
        format!("{} {}", label("order-phone"), html::escape(&order.phone)),
        format!("{} {}", label("order-address"), html::escape(&order.address)),
        format!("{} {}", label("order-shipping"), html::escape(&order.shipping_method)),
        format!("{} {:.2}", label("order-subtotal"), order.subtotal),
        format!("{} {:.2}", label("order-total"), order.total),
        String::new(),
        label("order-items"),
    ];

    lines.extend(format_items(&order.items));

    if let Some(coupons) = order.coupons.as_ref().and_then(format_coupons) {
        lines.push(format!("{} {}", label("order-coupons"), coupons));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} {}",
        label("order-created"),
        order.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!(
        "{} {}",
        label("order-updated"),
        order.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

/// One escaped line per item of the order's item payload
fn format_items(items: &Value) -> Vec<String> {
    match items {
        Value::Array(entries) if entries.is_empty() => vec!["—".to_string()],
        Value::Array(entries) => {
            let mut lines: Vec<String> = entries
                .iter()
                .take(MAX_ITEM_LINES)
                .map(format_item)
                .collect();
            if entries.len() > MAX_ITEM_LINES {
                lines.push(format!("… +{}", entries.len() - MAX_ITEM_LINES));
            }
            lines
        }
        Value::Null => vec!["—".to_string()],
        // Some shops store the payload as a JSON string
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Array(_)) => format_items(&parsed),
            _ => vec![html::escape(&truncate_message(raw, MAX_ITEM_NAME_CHARS))],
        },
        other => vec![html::escape(&truncate_message(&other.to_string(), MAX_ITEM_NAME_CHARS))],
    }
}

fn format_item(item: &Value) -> String {
    let Value::Object(fields) = item else {
        return format!(
            "• {}",
            html::escape(&truncate_message(&display_value(item), MAX_ITEM_NAME_CHARS))
        );
    };

    let name = ["name", "title", "productName", "sku"]
        .iter()
        .find_map(|key| fields.get(*key))
        .map(display_value)
        .unwrap_or_else(|| item.to_string());
    let mut line = format!(
        "• {}",
        html::escape(&truncate_message(&name, MAX_ITEM_NAME_CHARS))
    );

    if let Some(quantity) = fields.get("quantity").or_else(|| fields.get("qty")) {
        line.push_str(&format!(" × {}", html::escape(&display_value(quantity))));
    }
    if let Some(price) = fields.get("price") {
        line.push_str(&format!(" — {}", html::escape(&display_value(price))));
    }

    line
}

/// Comma separated coupon codes, or `None` when there are none
fn format_coupons(coupons: &Value) -> Option<String> {
    let codes: Vec<String> = match coupons {
        Value::Null => return None,
        Value::Array(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::Object(fields) => fields
                    .get("code")
                    .map(display_value)
                    .unwrap_or_else(|| entry.to_string()),
                other => display_value(other),
            })
            .collect(),
        Value::String(raw) if raw.trim().is_empty() => return None,
        other => vec![display_value(other)],
    };

    if codes.is_empty() {
        None
    } else {
        Some(html::escape(&codes.join(", ")))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cut a message to at most `max_chars` characters, marking the cut with an ellipsis
pub fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
