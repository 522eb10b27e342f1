//! In-memory gateway for tests, with failure injection and call counters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{GatewayError, PersistenceGateway};
use crate::models::{BackendId, RecordKind, RecordPayload, StoredRecord};

#[derive(Default)]
struct State {
    records: Vec<StoredRecord>,
    next_id: u64,
    online: bool,
    fail_creates: bool,
    fail_deletes: bool,
    fail_lists: bool,
    create_calls: usize,
    delete_calls: usize,
    delay: Option<Duration>,
}

/// Cloneable handle; clones share the same records and switches.
#[derive(Clone)]
pub struct MemoryGateway {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        let state = State {
            online: true,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A gateway that rejects every call until `set_online(true)`.
    pub fn offline() -> Self {
        let gateway = Self::new();
        gateway.set_online(false);
        gateway
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    pub fn fail_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_creates = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().unwrap().fail_deletes = fail;
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_lists = fail;
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn records(&self, kind: RecordKind) -> Vec<StoredRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.data.kind() == kind)
            .cloned()
            .collect()
    }

    /// Inserts a record directly, as if another client had created it.
    pub fn seed(&self, payload: RecordPayload) -> BackendId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = BackendId(format!("mem-{}", state.next_id));
        state.records.push(StoredRecord {
            id: id.clone(),
            created_at: payload.created_at,
            data: payload.data,
        });
        id
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn create(&self, payload: &RecordPayload) -> Result<BackendId, GatewayError> {
        self.pause().await;
        {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
            if !state.online {
                return Err(GatewayError::Unavailable("offline".to_string()));
            }
            if state.fail_creates {
                return Err(GatewayError::Rejected("create refused".to_string()));
            }
        }
        Ok(self.seed(payload.clone()))
    }

    async fn delete(&self, kind: RecordKind, id: &BackendId) -> Result<(), GatewayError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if !state.online {
            return Err(GatewayError::Unavailable("offline".to_string()));
        }
        if state.fail_deletes {
            return Err(GatewayError::Rejected("delete refused".to_string()));
        }
        state
            .records
            .retain(|r| !(r.data.kind() == kind && &r.id == id));
        Ok(())
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, GatewayError> {
        self.pause().await;
        {
            let state = self.state.lock().unwrap();
            if !state.online {
                return Err(GatewayError::Unavailable("offline".to_string()));
            }
            if state.fail_lists {
                return Err(GatewayError::Rejected("list refused".to_string()));
            }
        }
        Ok(self.records(kind))
    }
}
