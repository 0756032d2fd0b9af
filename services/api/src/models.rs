//! API models for usage tracking and request/response payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::limits::LimitType;

/// Resource kinds whose creation is metered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Recipes,
    Orders,
    Customers,
    Inventory,
}

impl UsageKind {
    pub const ALL: [UsageKind; 4] = [
        UsageKind::Recipes,
        UsageKind::Orders,
        UsageKind::Customers,
        UsageKind::Inventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Recipes => "recipes",
            UsageKind::Orders => "orders",
            UsageKind::Customers => "customers",
            UsageKind::Inventory => "inventory",
        }
    }

    /// Column in `usage_records` holding this counter
    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    /// Ceiling that governs this kind
    pub fn limit_type(&self) -> LimitType {
        match self {
            UsageKind::Recipes => LimitType::Recipes,
            UsageKind::Orders => LimitType::OrdersPerMonth,
            UsageKind::Customers => LimitType::Customers,
            UsageKind::Inventory => LimitType::InventoryItems,
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                "Invalid type. Must be one of: recipes, orders, customers, inventory".to_string()
            })
    }
}

/// The four counters of one user's monthly usage record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageCounts {
    pub recipes: u32,
    pub orders: u32,
    pub customers: u32,
    pub inventory: u32,
}

impl UsageCounts {
    pub fn get(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Recipes => self.recipes,
            UsageKind::Orders => self.orders,
            UsageKind::Customers => self.customers,
            UsageKind::Inventory => self.inventory,
        }
    }

    pub fn get_mut(&mut self, kind: UsageKind) -> &mut u32 {
        match kind {
            UsageKind::Recipes => &mut self.recipes,
            UsageKind::Orders => &mut self.orders,
            UsageKind::Customers => &mut self.customers,
            UsageKind::Inventory => &mut self.inventory,
        }
    }
}

/// Current-month usage as reported to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub recipes: u32,
    pub orders_this_month: u32,
    pub customers: u32,
    pub inventory_items: u32,
}

impl UsageStats {
    pub fn get(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Recipes => self.recipes,
            UsageKind::Orders => self.orders_this_month,
            UsageKind::Customers => self.customers,
            UsageKind::Inventory => self.inventory_items,
        }
    }
}

impl From<UsageCounts> for UsageStats {
    fn from(counts: UsageCounts) -> Self {
        Self {
            recipes: counts.recipes,
            orders_this_month: counts.orders,
            customers: counts.customers,
            inventory_items: counts.inventory,
        }
    }
}

/// Body of limit-check and increment/decrement requests
#[derive(Debug, Deserialize)]
pub struct UsageKindRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl UsageKindRequest {
    pub fn parse_kind(&self) -> Result<UsageKind, String> {
        match self.kind.as_deref() {
            Some(kind) => kind.parse(),
            None => Err("type is required".to_string()),
        }
    }
}

/// Client-tallied counts pushed by the sync endpoint; absent fields are 0
#[derive(Debug, Default, Deserialize)]
pub struct UsageSyncRequest {
    #[serde(default)]
    pub recipes: i64,
    #[serde(default)]
    pub orders: i64,
    #[serde(default)]
    pub customers: i64,
    #[serde(default)]
    pub inventory: i64,
}

/// Response carrying the caller's current usage
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub success: bool,
    pub usage: UsageStats,
}

/// Response to a sync request
#[derive(Debug, Serialize)]
pub struct UsageSyncResponse {
    pub success: bool,
    pub message: String,
    pub usage: UsageStats,
}
