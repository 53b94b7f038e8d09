use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{Cents, RecordId, StaffId};
use bistro_menu::MenuItemId;

/// Transaction identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub RecordId);

impl TransactionId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order lifecycle status as recorded by the order subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    Pending,
    InProgress,
    Ready,
    Completed,
    Cancelled,
    Paid,
    Refunded,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 7] = [
        TransactionStatus::Pending,
        TransactionStatus::InProgress,
        TransactionStatus::Ready,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
        TransactionStatus::Paid,
        TransactionStatus::Refunded,
    ];

    /// The order represents goods sold (it was neither cancelled nor refunded).
    pub fn is_sale(self) -> bool {
        !matches!(self, TransactionStatus::Cancelled | TransactionStatus::Refunded)
    }

    /// Money has actually been taken for the order.
    pub fn is_settled(self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Paid)
    }
}

/// Order line: menu item, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: Cents,
}

impl LineItem {
    pub fn new(menu_item_id: MenuItemId, quantity: u32, unit_price: Cents) -> Self {
        Self {
            menu_item_id,
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Cents {
        self.unit_price.times(self.quantity)
    }
}

/// A settled (or in-flight) order as emitted by the order subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub timestamp: DateTime<Utc>,
    pub total: Cents,
    pub status: TransactionStatus,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub staff_id: StaffId,
}

impl TransactionRecord {
    /// Σ quantity × unit price over all lines.
    ///
    /// May differ from `total` when the order subsystem applied discounts or
    /// service charges.
    pub fn line_items_total(&self) -> Cents {
        self.line_items.iter().map(LineItem::line_total).sum()
    }
}

/// Status filter for transaction queries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "statuses")]
pub enum StatusFilter {
    #[default]
    Any,
    Only(Vec<TransactionStatus>),
}

impl StatusFilter {
    pub fn only(statuses: impl IntoIterator<Item = TransactionStatus>) -> Self {
        Self::Only(statuses.into_iter().collect())
    }

    /// Completed or paid orders.
    pub fn settled() -> Self {
        Self::only([TransactionStatus::Completed, TransactionStatus::Paid])
    }

    pub fn matches(&self, status: TransactionStatus) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Only(statuses) => statuses.contains(&status),
        }
    }
}
