//! Points ledger and the accessory marketplace.
//!
//! Points are earned by finishing tasks and focus blocks and spent on
//! cosmetic accessories. The ledger is append-only: every award and spend is
//! kept in [`PointsLedger::history`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use pomopet_core::AccessoryId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DeskError, Result};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// When it was recorded.
    pub at: DateTime<Utc>,
    /// Signed change in points.
    pub delta: i64,
    /// Why.
    pub reason: String,
    /// Balance after this entry.
    pub balance_after: u32,
}

/// Point balance plus its history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointsLedger {
    balance: u32,
    history: Vec<LedgerEntry>,
}

impl PointsLedger {
    /// A ledger with an opening balance.
    #[must_use]
    pub fn with_balance(balance: u32) -> Self {
        Self {
            balance,
            history: Vec::new(),
        }
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> u32 {
        self.balance
    }

    /// Every award and spend, oldest first.
    #[must_use]
    pub fn history(&self) -> &[LedgerEntry] {
        &self.history
    }

    /// Credit points. Returns the new balance.
    pub fn award_points(&mut self, amount: u32, reason: impl Into<String>) -> u32 {
        self.balance = self.balance.saturating_add(amount);
        self.record(i64::from(amount), reason.into());
        self.balance
    }

    /// Debit points. Returns the new balance.
    ///
    /// # Errors
    /// [`DeskError::InsufficientPoints`]; the balance is unchanged.
    pub fn spend(&mut self, amount: u32, reason: impl Into<String>) -> Result<u32> {
        if amount > self.balance {
            return Err(DeskError::InsufficientPoints {
                needed: amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        self.record(-i64::from(amount), reason.into());
        Ok(self.balance)
    }

    fn record(&mut self, delta: i64, reason: String) {
        debug!(delta, balance = self.balance, reason = %reason, "Ledger entry");
        self.history.push(LedgerEntry {
            at: Utc::now(),
            delta,
            reason,
            balance_after: self.balance,
        });
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A purchasable accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    /// Accessory ID, as equipped on the pet.
    pub id: &'static str,
    /// Shop display name.
    pub name: &'static str,
    /// Price in points.
    pub price: u32,
}

impl CatalogItem {
    /// The accessory this item unlocks.
    #[must_use]
    pub fn accessory(&self) -> AccessoryId {
        AccessoryId::from(self.id)
    }
}

const STANDARD_ITEMS: &[CatalogItem] = &[
    CatalogItem { id: "bow_tie", name: "Bow Tie", price: 30 },
    CatalogItem { id: "scarf", name: "Cozy Scarf", price: 40 },
    CatalogItem { id: "party_hat", name: "Party Hat", price: 50 },
    CatalogItem { id: "sunglasses", name: "Sunglasses", price: 80 },
    CatalogItem { id: "wizard_hat", name: "Wizard Hat", price: 120 },
    CatalogItem { id: "crown", name: "Golden Crown", price: 250 },
];

/// The fixed set of items for sale.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    items: &'static [CatalogItem],
}

impl Catalog {
    /// The built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            items: STANDARD_ITEMS,
        }
    }

    /// Every item, cheapest first.
    #[must_use]
    pub fn items(&self) -> &'static [CatalogItem] {
        self.items
    }

    /// Find an item by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'static CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Rewards: ledger + ownership
// ---------------------------------------------------------------------------

/// Everything the user has earned and bought.
#[derive(Debug, Clone, Default)]
pub struct Rewards {
    ledger: PointsLedger,
    catalog: Catalog,
    owned: BTreeSet<AccessoryId>,
}

impl Rewards {
    /// Fresh rewards with an opening balance and the standard catalog.
    #[must_use]
    pub fn new(starting_balance: u32) -> Self {
        Self {
            ledger: PointsLedger::with_balance(starting_balance),
            catalog: Catalog::standard(),
            owned: BTreeSet::new(),
        }
    }

    /// The ledger.
    #[must_use]
    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// The catalog.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.catalog
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> u32 {
        self.ledger.balance()
    }

    /// Credit points. Returns the new balance.
    pub fn award_points(&mut self, amount: u32, reason: impl Into<String>) -> u32 {
        self.ledger.award_points(amount, reason)
    }

    /// Whether the accessory has been bought.
    #[must_use]
    pub fn owns(&self, accessory: &AccessoryId) -> bool {
        self.owned.contains(accessory)
    }

    /// Accessories bought so far.
    pub fn owned(&self) -> impl Iterator<Item = &AccessoryId> {
        self.owned.iter()
    }

    /// Buy an item.
    ///
    /// # Errors
    /// [`DeskError::UnknownItem`], [`DeskError::AlreadyOwned`] or
    /// [`DeskError::InsufficientPoints`]. Nothing changes on error.
    pub fn purchase(&mut self, item_id: &str) -> Result<&'static CatalogItem> {
        let item = self
            .catalog
            .get(item_id)
            .ok_or_else(|| DeskError::UnknownItem(item_id.to_string()))?;
        let accessory = item.accessory();
        if self.owned.contains(&accessory) {
            return Err(DeskError::AlreadyOwned(item_id.to_string()));
        }
        self.ledger.spend(item.price, format!("purchase {}", item.id))?;
        self.owned.insert(accessory);
        info!(item = item.id, price = item.price, balance = self.balance(), "Item purchased");
        Ok(item)
    }
}
