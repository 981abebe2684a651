//! Shared stock levels.

use crate::order::OrderItem;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Process-wide stock levels keyed by product id.
///
/// Clones share the same table. Each operation locks the table once, so a
/// reservation checks and decrements every line atomically; nothing spans
/// more than one call.
#[derive(Clone, Debug, Default)]
pub struct StockTable {
    levels: Arc<Mutex<HashMap<String, u32>>>,
}

impl StockTable {
    /// Create a table with initial levels
    pub fn with_levels<I, K>(levels: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        Self {
            levels: Arc::new(Mutex::new(
                levels
                    .into_iter()
                    .map(|(product, level)| (product.into(), level))
                    .collect(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.levels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current level of `product_id`, `None` for unknown products
    #[must_use]
    pub fn level(&self, product_id: &str) -> Option<u32> {
        self.lock().get(product_id).copied()
    }

    /// Reserve every line, or nothing.
    ///
    /// Lines naming the same product are totalled before they are checked
    /// against its level.
    ///
    /// # Errors
    ///
    /// Returns the ids of the products that are unknown or short, once each
    /// in order of first appearance, and leaves the table untouched.
    pub fn reserve(&self, items: &[OrderItem]) -> Result<(), Vec<String>> {
        let mut wanted: Vec<(&str, u32)> = Vec::new();
        for item in items {
            match wanted.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, total)) => *total = total.saturating_add(item.quantity),
                None => wanted.push((item.product_id.as_str(), item.quantity)),
            }
        }

        let mut levels = self.lock();
        let unavailable: Vec<String> = wanted
            .iter()
            .filter(|(id, total)| levels.get(*id).is_none_or(|level| level < total))
            .map(|(id, _)| (*id).to_string())
            .collect();
        if !unavailable.is_empty() {
            return Err(unavailable);
        }

        for (id, total) in wanted {
            if let Some(level) = levels.get_mut(id) {
                *level -= total;
            }
        }
        Ok(())
    }

    /// Put every line back. Unknown products are ignored.
    pub fn release(&self, items: &[OrderItem]) {
        let mut levels = self.lock();
        for item in items {
            if let Some(level) = levels.get_mut(&item.product_id) {
                *level += item.quantity;
            }
        }
    }
}
