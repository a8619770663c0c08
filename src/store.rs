use serde::{Deserialize, Serialize};

use crate::entities::{Fee, FeeType, Obligation, Payment, PaymentPlan, SchoolClass, Student};
use crate::errors::{FeeError, Result};
use crate::types::{FeeId, FeeTypeId, PlanId};

/// predicate-filtered collection, the repository capability for one entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<T> {
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_all(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.iter().filter(|r| pred(r)).cloned().collect()
    }

    pub fn find_first(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.iter().find(|r| pred(r)).cloned()
    }

    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.iter().any(|r| pred(r))
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(r)).count()
    }

    pub fn insert(&mut self, row: T) {
        self.rows.push(row);
    }

    /// replace the first matching row, returning whether one was found
    pub fn update_first(&mut self, pred: impl Fn(&T) -> bool, row: T) -> bool {
        for slot in self.rows.iter_mut() {
            if pred(slot) {
                *slot = row;
                return true;
            }
        }
        false
    }

    /// remove matching rows, returning how many were removed
    pub fn delete_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !pred(r));
        before - self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// the full tenant-partitioned data set behind one transactional boundary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    pub classes: Table<SchoolClass>,
    pub students: Table<Student>,
    pub fee_types: Table<FeeType>,
    pub payment_plans: Table<PaymentPlan>,
    pub fees: Table<Fee>,
    pub obligations: Table<Obligation>,
    pub payments: Table<Payment>,
    next_fee_id: FeeId,
    next_fee_type_id: FeeTypeId,
    next_plan_id: PlanId,
}

impl StoreData {
    pub fn allocate_fee_id(&mut self) -> FeeId {
        self.next_fee_id += 1;
        self.next_fee_id
    }

    pub fn allocate_fee_type_id(&mut self) -> FeeTypeId {
        self.next_fee_type_id += 1;
        self.next_fee_type_id
    }

    pub fn allocate_plan_id(&mut self) -> PlanId {
        self.next_plan_id += 1;
        self.next_plan_id
    }

    /// replace an obligation, rejecting writes made against a stale copy
    ///
    /// the returned obligation carries the bumped version and is the one the
    /// caller must hand out
    pub fn update_obligation(&mut self, mut updated: Obligation) -> Result<Obligation> {
        let current = self
            .obligations
            .find_first(|o| o.id == updated.id)
            .ok_or(FeeError::StaleObligation { id: updated.id })?;

        if current.version != updated.version {
            return Err(FeeError::StaleObligation { id: updated.id });
        }

        updated.version += 1;
        self.obligations.update_first(|o| o.id == updated.id, updated.clone());
        Ok(updated)
    }
}

/// in-memory store with copy-on-commit transactions
///
/// exclusive `&mut` access serializes every multi-entity operation, which is
/// what makes identifier generation and obligation writes race-free here; a
/// database-backed implementation would use row locks or a retry loop instead
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: StoreData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// run a multi-entity operation as one atomic unit
    ///
    /// the closure works against a copy of the data; the copy replaces the
    /// live data only when the closure succeeds, so no partial state is ever
    /// observable and every error path rolls back
    pub fn transaction<T>(&mut self, op: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut working = self.data.clone();
        let out = op(&mut working)?;
        self.data = working;
        Ok(out)
    }

    /// serialize the full data set to pretty-printed json
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.data)
    }

    /// restore a store from a json snapshot
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self {
            data: serde_json::from_str(json)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::types::StudentId;
    use chrono::Utc;

    fn obligation() -> Obligation {
        Obligation::new(
            7,
            StudentId::from("096700701001"),
            1,
            1,
            Money::from_major(500),
            Money::from_major(500),
            Utc::now(),
        )
    }

    #[test]
    fn test_table_predicates() {
        let mut table = Table::new();
        table.insert(SchoolClass {
            class_id: 701,
            tenant_id: 7,
            class_name: "Grade 1".to_string(),
        });
        table.insert(SchoolClass {
            class_id: 801,
            tenant_id: 8,
            class_name: "Grade 1".to_string(),
        });

        assert_eq!(table.find_all(|c| c.tenant_id == 7).len(), 1);
        assert!(table.find_first(|c| c.class_id == 801).is_some());
        assert!(table.any(|c| c.class_name == "Grade 1"));
        assert_eq!(table.delete_where(|c| c.tenant_id == 8), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let mut store = MemoryStore::new();
        store
            .transaction(|data| {
                data.obligations.insert(obligation());
                Ok(())
            })
            .unwrap();
        assert_eq!(store.data().obligations.len(), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut store = MemoryStore::new();
        let result: Result<()> = store.transaction(|data| {
            data.obligations.insert(obligation());
            data.obligations.insert(obligation());
            Err(FeeError::UnsupportedInterval { months: 6 })
        });

        assert!(result.is_err());
        assert!(store.data().obligations.is_empty());
    }

    #[test]
    fn test_versioned_update_rejects_stale_copy() {
        let mut store = MemoryStore::new();
        let ob = obligation();
        let stale = ob.clone();
        store
            .transaction(|data| {
                data.obligations.insert(ob);
                Ok(())
            })
            .unwrap();

        // first writer wins
        store
            .transaction(|data| {
                let mut fresh = stale.clone();
                fresh.total_amount = Money::from_major(400);
                data.update_obligation(fresh)?;
                Ok(())
            })
            .unwrap();

        // second writer still holds version 0
        let err = store
            .transaction(|data| {
                let mut lost = stale.clone();
                lost.total_amount = Money::from_major(300);
                data.update_obligation(lost)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, FeeError::StaleObligation { .. }));

        let current = store
            .data()
            .obligations
            .find_first(|o| o.id == stale.id)
            .unwrap();
        assert_eq!(current.total_amount, Money::from_major(400));
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_json_snapshot_round_trip() {
        let mut store = MemoryStore::new();
        store
            .transaction(|data| {
                let id = data.allocate_fee_id();
                assert_eq!(id, 1);
                data.obligations.insert(obligation());
                Ok(())
            })
            .unwrap();

        let json = store.to_json().unwrap();
        let restored = MemoryStore::from_json(&json).unwrap();
        assert_eq!(restored.data().obligations.len(), 1);

        // id counters survive the round trip
        let mut restored = restored;
        restored
            .transaction(|data| {
                assert_eq!(data.allocate_fee_id(), 2);
                Ok(())
            })
            .unwrap();
    }
}
