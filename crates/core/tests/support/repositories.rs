//! In-memory mock for `SaleRepository`
//!
//! Holds rows keyed by natural key, mimics the `IS NULL` candidate query and
//! the guarded update, and can be scripted to fail writes for a given NSU.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use installsync_core::SaleRepository;
use installsync_domain::{InstallmentQuantity, Result as DomainResult, SaleRecord, SyncError};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    rows: HashMap<SaleRecord, Option<InstallmentQuantity>>,
    write_failures: HashMap<String, VecDeque<SyncError>>,
    update_calls: Vec<(SaleRecord, InstallmentQuantity)>,
    find_error: Option<SyncError>,
}

#[derive(Clone, Default)]
pub struct InMemorySaleRepository {
    state: Arc<Mutex<State>>,
}

impl InMemorySaleRepository {
    pub fn with_pending(records: &[SaleRecord]) -> Self {
        let repo = Self::default();
        {
            let mut state = repo.state.lock();
            for record in records {
                state.rows.insert(record.clone(), None);
            }
        }
        repo
    }

    pub fn insert_reconciled(&self, record: SaleRecord, quantity: InstallmentQuantity) {
        self.state.lock().rows.insert(record, Some(quantity));
    }

    /// Queue errors returned by the next writes for `nsu`, in order.
    pub fn fail_writes(&self, nsu: &str, errors: Vec<SyncError>) {
        self.state.lock().write_failures.entry(nsu.to_string()).or_default().extend(errors);
    }

    pub fn fail_find(&self, error: SyncError) {
        self.state.lock().find_error = Some(error);
    }

    pub fn stored(&self, record: &SaleRecord) -> Option<InstallmentQuantity> {
        self.state.lock().rows.get(record).copied().flatten()
    }

    pub fn update_calls(&self) -> Vec<(SaleRecord, InstallmentQuantity)> {
        self.state.lock().update_calls.clone()
    }
}

#[async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn find_pending(&self) -> DomainResult<Vec<SaleRecord>> {
        let state = self.state.lock();
        if let Some(err) = state.find_error.clone() {
            return Err(err);
        }
        let mut pending: Vec<SaleRecord> = state
            .rows
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(record, _)| record.clone())
            .collect();
        pending.sort_by(|a, b| (a.sale_date, &a.nsu).cmp(&(b.sale_date, &b.nsu)));
        Ok(pending)
    }

    async fn update_installments(
        &self,
        record: &SaleRecord,
        quantity: InstallmentQuantity,
    ) -> DomainResult<u64> {
        let mut state = self.state.lock();
        state.update_calls.push((record.clone(), quantity));

        if let Some(err) = state.write_failures.get_mut(&record.nsu).and_then(VecDeque::pop_front) {
            return Err(err);
        }

        match state.rows.get_mut(record) {
            Some(slot) if slot.is_none() => {
                *slot = Some(quantity);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
