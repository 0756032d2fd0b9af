//! Tier-based ceilings and feature flags.
//!
//! The policy table is plain data built once at start-up and shared by
//! `Arc`; nothing mutates it at runtime.

use common::Tier;
use serde::Serialize;

/// Numeric ceilings a tier can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    Recipes,
    OrdersPerMonth,
    Customers,
    InventoryItems,
}

/// Boolean capabilities a tier can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    AdvancedAnalytics,
    ProfitReports,
    ExportData,
    InventoryAlerts,
    CustomBranding,
    MultiLocation,
    PrioritySupport,
}

/// Ceilings for one tier. `None` = unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ceilings {
    pub recipes: Option<u32>,
    pub orders_per_month: Option<u32>,
    pub customers: Option<u32>,
    pub inventory_items: Option<u32>,
}

impl Ceilings {
    pub const UNLIMITED: Ceilings = Ceilings {
        recipes: None,
        orders_per_month: None,
        customers: None,
        inventory_items: None,
    };

    pub fn get(&self, limit_type: LimitType) -> Option<u32> {
        match limit_type {
            LimitType::Recipes => self.recipes,
            LimitType::OrdersPerMonth => self.orders_per_month,
            LimitType::Customers => self.customers,
            LimitType::InventoryItems => self.inventory_items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub advanced_analytics: bool,
    pub profit_reports: bool,
    pub export_data: bool,
    pub inventory_alerts: bool,
    pub custom_branding: bool,
    pub multi_location: bool,
    pub priority_support: bool,
}

impl FeatureFlags {
    pub const NONE: FeatureFlags = FeatureFlags {
        advanced_analytics: false,
        profit_reports: false,
        export_data: false,
        inventory_alerts: false,
        custom_branding: false,
        multi_location: false,
        priority_support: false,
    };

    pub const ALL: FeatureFlags = FeatureFlags {
        advanced_analytics: true,
        profit_reports: true,
        export_data: true,
        inventory_alerts: true,
        custom_branding: true,
        multi_location: true,
        priority_support: true,
    };

    pub fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::AdvancedAnalytics => self.advanced_analytics,
            Feature::ProfitReports => self.profit_reports,
            Feature::ExportData => self.export_data,
            Feature::InventoryAlerts => self.inventory_alerts,
            Feature::CustomBranding => self.custom_branding,
            Feature::MultiLocation => self.multi_location,
            Feature::PrioritySupport => self.priority_support,
        }
    }
}

/// Everything one tier is entitled to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub ceilings: Ceilings,
    pub features: FeatureFlags,
}

/// The full tier → entitlement table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitPolicy {
    free: TierLimits,
    pro: TierLimits,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl LimitPolicy {
    /// # Tier Configuration
    ///
    /// | Tier | Recipes | Orders/month | Customers | Inventory | Features |
    /// |------|---------|--------------|-----------|-----------|----------|
    /// | Free | 5 | 15 | 10 | 20 | none |
    /// | Pro | Unlimited | Unlimited | Unlimited | Unlimited | all |
    pub fn standard() -> Self {
        Self {
            free: TierLimits {
                ceilings: Ceilings {
                    recipes: Some(5),
                    orders_per_month: Some(15),
                    customers: Some(10),
                    inventory_items: Some(20),
                },
                features: FeatureFlags::NONE,
            },
            pro: TierLimits {
                ceilings: Ceilings::UNLIMITED,
                features: FeatureFlags::ALL,
            },
        }
    }

    pub fn new(free: TierLimits, pro: TierLimits) -> Self {
        Self { free, pro }
    }

    pub fn for_tier(&self, tier: Tier) -> &TierLimits {
        match tier {
            Tier::Free => &self.free,
            Tier::Pro => &self.pro,
        }
    }

    /// Ceiling for `limit_type` under `tier`; `None` when unbounded
    pub fn get_limit(&self, tier: Tier, limit_type: LimitType) -> Option<u32> {
        self.for_tier(tier).ceilings.get(limit_type)
    }

    pub fn has_feature(&self, tier: Tier, feature: Feature) -> bool {
        self.for_tier(tier).features.enabled(feature)
    }
}
