//! In-memory deliberation store
//!
//! All state sits behind one `RwLock`. A transaction buffers its writes and
//! applies them under a single write guard on commit, after checking every
//! write, so readers see either none or all of them.

use async_trait::async_trait;
use council_application::{
    DeliberationPage, DeliberationRepository, DeliberationTransaction, ListFilter,
    RepositoryError,
};
use council_domain::{
    AgentResponse, ConsensusRecord, Deliberation, DeliberationFlag, DeliberationId,
    DeliberationResult, DeliberationStatus, EvidenceTrail, RequesterId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Store {
    deliberations: HashMap<DeliberationId, Deliberation>,
    responses: HashMap<DeliberationId, Vec<AgentResponse>>,
    records: HashMap<DeliberationId, ConsensusRecord>,
    trails: HashMap<DeliberationId, EvidenceTrail>,
    flags: HashMap<DeliberationId, Vec<DeliberationFlag>>,
}

impl Store {
    fn deliberation(&self, id: DeliberationId) -> Result<&Deliberation, RepositoryError> {
        self.deliberations
            .get(&id)
            .ok_or(RepositoryError::NotFound(id))
    }

    /// Reject writes to missing or already-terminal deliberations
    fn check_writable(&self, id: DeliberationId) -> Result<(), RepositoryError> {
        let stored = self.deliberation(id)?;
        if stored.is_terminal() {
            return Err(RepositoryError::Conflict(format!(
                "deliberation {} is already {}",
                id,
                stored.status()
            )));
        }
        Ok(())
    }

    fn is_flagged(&self, id: &DeliberationId) -> bool {
        self.flags.get(id).is_some_and(|f| !f.is_empty())
    }
}

/// Process-local [`DeliberationRepository`]
#[derive(Clone, Default)]
pub struct InMemoryDeliberationRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryDeliberationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags recorded for one deliberation, oldest first
    pub async fn flags(&self, id: DeliberationId) -> Vec<DeliberationFlag> {
        self.store
            .read()
            .await
            .flags
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.deliberations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DeliberationRepository for InMemoryDeliberationRepository {
    async fn create_deliberation(
        &self,
        deliberation: &Deliberation,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        if store.deliberations.contains_key(&deliberation.id) {
            return Err(RepositoryError::Conflict(format!(
                "deliberation {} already exists",
                deliberation.id
            )));
        }
        store
            .deliberations
            .insert(deliberation.id, deliberation.clone());
        Ok(())
    }

    async fn update_deliberation_status(
        &self,
        deliberation: &Deliberation,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        store.check_writable(deliberation.id)?;
        store
            .deliberations
            .insert(deliberation.id, deliberation.clone());
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn DeliberationTransaction>, RepositoryError> {
        Ok(Box::new(MemoryTransaction {
            store: Arc::clone(&self.store),
            writes: Vec::new(),
        }))
    }

    async fn get_deliberation(&self, id: DeliberationId) -> Result<Deliberation, RepositoryError> {
        self.store.read().await.deliberation(id).cloned()
    }

    async fn get_deliberation_with_responses(
        &self,
        id: DeliberationId,
    ) -> Result<DeliberationResult, RepositoryError> {
        let store = self.store.read().await;
        let deliberation = store.deliberation(id)?.clone();
        let mut agent_responses = store.responses.get(&id).cloned().unwrap_or_default();
        agent_responses.sort_by_key(|r| r.sequence);
        Ok(DeliberationResult {
            deliberation,
            consensus_record: store.records.get(&id).cloned(),
            evidence_trail: store.trails.get(&id).cloned(),
            agent_responses,
        })
    }

    async fn get_evidence_trail(
        &self,
        id: DeliberationId,
    ) -> Result<Option<EvidenceTrail>, RepositoryError> {
        let store = self.store.read().await;
        store.deliberation(id)?;
        Ok(store.trails.get(&id).cloned())
    }

    async fn list_deliberations(
        &self,
        requester_id: &RequesterId,
        is_admin: bool,
        filter: &ListFilter,
    ) -> Result<DeliberationPage, RepositoryError> {
        let store = self.store.read().await;
        let mut matching: Vec<&Deliberation> = store
            .deliberations
            .values()
            .filter(|d| is_admin || &d.requester_id == requester_id)
            .filter(|d| filter.matches(d))
            .filter(|d| {
                filter
                    .flagged
                    .is_none_or(|flagged| store.is_flagged(&d.id) == flagged)
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect();
        Ok(DeliberationPage {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn flag_deliberation(&self, flag: &DeliberationFlag) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        store.deliberation(flag.deliberation_id)?;
        store
            .flags
            .entry(flag.deliberation_id)
            .or_default()
            .push(flag.clone());
        Ok(())
    }
}

enum Write {
    Responses(DeliberationId, Vec<AgentResponse>),
    Record(ConsensusRecord),
    Trail(EvidenceTrail),
    Status(Deliberation),
}

impl Write {
    fn deliberation_id(&self) -> DeliberationId {
        match self {
            Write::Responses(id, _) => *id,
            Write::Record(record) => record.deliberation_id,
            Write::Trail(trail) => trail.deliberation_id,
            Write::Status(deliberation) => deliberation.id,
        }
    }
}

struct MemoryTransaction {
    store: Arc<RwLock<Store>>,
    writes: Vec<Write>,
}

fn has_record(store: &Store, writes: &[Write], id: DeliberationId) -> bool {
    store.records.contains_key(&id)
        || writes
            .iter()
            .any(|w| matches!(w, Write::Record(r) if r.deliberation_id == id))
}

#[async_trait]
impl DeliberationTransaction for MemoryTransaction {
    async fn save_agent_responses(
        &mut self,
        responses: &[AgentResponse],
    ) -> Result<(), RepositoryError> {
        let mut by_deliberation: HashMap<DeliberationId, Vec<AgentResponse>> = HashMap::new();
        for response in responses {
            by_deliberation
                .entry(response.deliberation_id)
                .or_default()
                .push(response.clone());
        }
        self.writes.extend(
            by_deliberation
                .into_iter()
                .map(|(id, responses)| Write::Responses(id, responses)),
        );
        Ok(())
    }

    async fn save_consensus_record(
        &mut self,
        record: &ConsensusRecord,
    ) -> Result<(), RepositoryError> {
        self.writes.push(Write::Record(record.clone()));
        Ok(())
    }

    async fn save_evidence_trail(&mut self, trail: &EvidenceTrail) -> Result<(), RepositoryError> {
        self.writes.push(Write::Trail(trail.clone()));
        Ok(())
    }

    async fn update_deliberation_status(
        &mut self,
        deliberation: &Deliberation,
    ) -> Result<(), RepositoryError> {
        self.writes.push(Write::Status(deliberation.clone()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryTransaction { store: shared, writes } = *self;
        let mut store = shared.write().await;

        for write in &writes {
            let id = write.deliberation_id();
            store.check_writable(id)?;
            if let Write::Status(deliberation) = write
                && deliberation.status() == DeliberationStatus::Completed
                && !has_record(&store, &writes, id)
            {
                return Err(RepositoryError::Conflict(format!(
                    "deliberation {id} cannot complete without a consensus record"
                )));
            }
        }

        let count = writes.len();
        for write in writes {
            match write {
                Write::Responses(id, responses) => {
                    store.responses.entry(id).or_default().extend(responses);
                }
                Write::Record(record) => {
                    store.records.insert(record.deliberation_id, record);
                }
                Write::Trail(trail) => {
                    store.trails.insert(trail.deliberation_id, trail);
                }
                Write::Status(deliberation) => {
                    store.deliberations.insert(deliberation.id, deliberation);
                }
            }
        }
        debug!("Committed {} writes", count);
        Ok(())
    }
}
