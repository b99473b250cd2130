//! Order lookup against a fixed in-memory dataset.
//!
//! Extracts an order number from free text (`#12345`, `order 12345`,
//! `order number 12345`) and formats the matching order. A recognized
//! number that is not in the dataset produces a "not found" message so the
//! downstream agents can tell "no order referenced" from "order unknown".

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

/// One line item on an order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub product: &'static str,
    pub quantity: u32,
    pub price: f64,
    pub sku: &'static str,
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Delivered,
    InTransit,
}

impl OrderStatus {
    fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::InTransit => "IN_TRANSIT",
        }
    }
}

/// A stored order.
#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: &'static str,
    pub customer_email: &'static str,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub shipping_address: &'static str,
    pub tracking_number: &'static str,
    pub delivery_date: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// In-memory order database.
#[derive(Debug, Clone)]
pub struct OrderLookup {
    orders: HashMap<&'static str, Order>,
}

fn order_number_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"#(\d+)").expect("order pattern is valid"),
            Regex::new(r"(?i)order\s+#?(\d+)").expect("order pattern is valid"),
            Regex::new(r"(?i)order\s+number\s+#?(\d+)").expect("order pattern is valid"),
        ]
    })
}

impl OrderLookup {
    pub fn new() -> Self {
        Self {
            orders: sample_orders(),
        }
    }

    /// Extract an order number from free text.
    pub fn extract_order_number(text: &str) -> Option<String> {
        order_number_patterns()
            .iter()
            .find_map(|pattern| pattern.captures(text))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Look up an order referenced in free text.
    ///
    /// Returns `None` only when no order number appears in the text. A
    /// number that does not resolve yields a formatted not-found message.
    pub fn lookup(&self, text: &str) -> Option<String> {
        let order_number = Self::extract_order_number(text)?;

        match self.orders.get(order_number.as_str()) {
            Some(order) => Some(format_order(order)),
            None => Some(format!("Order #{} not found in system.", order_number)),
        }
    }

    /// Raw order data by id.
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Whether an order was placed within the last `days` days.
    pub fn is_within_refund_window(&self, order_id: &str, days: i64) -> bool {
        self.get(order_id)
            .map(|order| Utc::now() - order.order_date <= Duration::days(days))
            .unwrap_or(false)
    }
}

impl Default for OrderLookup {
    fn default() -> Self {
        Self::new()
    }
}

fn format_order(order: &Order) -> String {
    let items_text = order
        .items
        .iter()
        .map(|item| {
            format!(
                "  - {} (Qty: {}) - ${:.2}",
                item.product, item.quantity, item.price
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut result = format!(
        "Order #{}\nStatus: {}\nOrder Date: {}\nTotal: ${:.2}\n\nItems:\n{}\n\nShipping: {}\nTracking: {}",
        order.order_id,
        order.status.as_str(),
        order.order_date.format("%Y-%m-%d"),
        order.total,
        items_text,
        order.shipping_address,
        order.tracking_number,
    );

    if let Some(delivered) = order.delivery_date {
        result.push_str(&format!("\nDelivered: {}", delivered.format("%Y-%m-%d")));
    } else if let Some(estimated) = order.estimated_delivery {
        result.push_str(&format!(
            "\nEstimated Delivery: {}",
            estimated.format("%Y-%m-%d")
        ));
    }

    result
}

fn sample_orders() -> HashMap<&'static str, Order> {
    let now = Utc::now();
    let mut orders = HashMap::new();

    orders.insert(
        "12345",
        Order {
            order_id: "12345",
            customer_email: "customer@example.com",
            order_date: now - Duration::days(10),
            status: OrderStatus::Delivered,
            items: vec![OrderItem {
                product: "iPhone 15",
                quantity: 1,
                price: 799.00,
                sku: "IPHONE15-BLK-128",
            }],
            total: 799.00,
            shipping_address: "123 Main St, Anytown, USA",
            tracking_number: "1Z999AA10123456784",
            delivery_date: Some(now - Duration::days(3)),
            estimated_delivery: None,
        },
    );

    orders.insert(
        "67890",
        Order {
            order_id: "67890",
            customer_email: "john@example.com",
            order_date: now - Duration::days(5),
            status: OrderStatus::InTransit,
            items: vec![OrderItem {
                product: "iPhone 15 Pro",
                quantity: 1,
                price: 999.00,
                sku: "IPHONE15PRO-TIT-256",
            }],
            total: 999.00,
            shipping_address: "456 Oak Ave, Other City, USA",
            tracking_number: "1Z999AA10123456785",
            delivery_date: None,
            estimated_delivery: Some(now + Duration::days(2)),
        },
    );

    orders.insert(
        "11111",
        Order {
            order_id: "11111",
            customer_email: "sarah@example.com",
            order_date: now - Duration::days(45),
            status: OrderStatus::Delivered,
            items: vec![OrderItem {
                product: "iPhone 15",
                quantity: 1,
                price: 799.00,
                sku: "IPHONE15-PINK-256",
            }],
            total: 799.00,
            shipping_address: "789 Elm St, Some Town, USA",
            tracking_number: "1Z999AA10123456786",
            delivery_date: Some(now - Duration::days(40)),
            estimated_delivery: None,
        },
    );

    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hash_prefixed_number() {
        assert_eq!(
            OrderLookup::extract_order_number("refund for order #12345 please"),
            Some("12345".to_string())
        );
    }

    #[test]
    fn extracts_order_keyword_number() {
        assert_eq!(
            OrderLookup::extract_order_number("where is Order 67890?"),
            Some("67890".to_string())
        );
        assert_eq!(
            OrderLookup::extract_order_number("my order number 11111 is late"),
            Some("11111".to_string())
        );
    }

    #[test]
    fn no_number_means_no_lookup() {
        let lookup = OrderLookup::new();
        assert!(lookup.lookup("my package is late").is_none());
    }

    #[test]
    fn known_order_is_formatted() {
        let lookup = OrderLookup::new();
        let text = lookup.lookup("refund for #12345").unwrap();
        assert!(text.contains("Order #12345"));
        assert!(text.contains("Status: DELIVERED"));
        assert!(text.contains("$799.00"));
        assert!(text.contains("iPhone 15"));
    }

    #[test]
    fn unknown_order_yields_not_found_message() {
        let lookup = OrderLookup::new();
        let text = lookup.lookup("order #99999 refund please").unwrap();
        assert_eq!(text, "Order #99999 not found in system.");
    }

    #[test]
    fn refund_window_arithmetic() {
        let lookup = OrderLookup::new();
        // Ordered 10 days ago: inside a 30-day window.
        assert!(lookup.is_within_refund_window("12345", 30));
        // Ordered 45 days ago: outside.
        assert!(!lookup.is_within_refund_window("11111", 30));
        // Unknown order: never within the window.
        assert!(!lookup.is_within_refund_window("99999", 30));
    }

    #[test]
    fn in_transit_order_shows_estimate() {
        let lookup = OrderLookup::new();
        let text = lookup.lookup("order 67890").unwrap();
        assert!(text.contains("Status: IN_TRANSIT"));
        assert!(text.contains("Estimated Delivery:"));
    }
}
