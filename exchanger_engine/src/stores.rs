//! Reference [`RequestStore`] implementation.
//!
//! The production deployment plugs its own persistence layer in behind the trait; this in-memory store backs local
//! runs and integration tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::{
    db_types::{ExchangeRequest, RequestId, RequestStatus},
    errors::StoreError,
    traits::RequestStore,
};

/// An in-memory request store. Cheap to clone; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRequestStore {
    requests: Arc<Mutex<BTreeMap<RequestId, ExchangeRequest>>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, request: ExchangeRequest) {
        self.requests.lock().unwrap().insert(request.id, request);
    }

    pub fn get(&self, id: RequestId) -> Option<ExchangeRequest> {
        self.requests.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().unwrap().is_empty()
    }
}

impl RequestStore for MemoryRequestStore {
    async fn fetch_requests_by_status(
        &self,
        statuses: &[RequestStatus],
    ) -> Result<Vec<ExchangeRequest>, StoreError> {
        let requests = self.requests.lock().unwrap();
        Ok(requests.values().filter(|r| statuses.contains(&r.status)).cloned().collect())
    }

    async fn update_request(&self, request: &ExchangeRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().unwrap();
        match requests.get_mut(&request.id) {
            Some(existing) => {
                existing.status = request.status;
                existing.updated_at = request.updated_at;
                Ok(())
            },
            None => Err(StoreError::UpdateFailed(format!("No request with id {}", request.id))),
        }
    }
}
