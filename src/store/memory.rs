//! In-memory workflow store.
//!
//! [`MemoryStore`] keeps the three entity tables in `HashMap`s behind a
//! single [`tokio::sync::RwLock`]. Every multi-row transition runs inside
//! one write-lock critical section, which gives the same atomicity the
//! Postgres store gets from transactions. Used in standalone mode and by
//! the unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AcceptOutcome, CompletionOutcome, ProposeOutcome, WorkflowStore};
use crate::domain::{
    HelpMatch, HelpRequest, HelperOffer, MatchId, MatchStatus, OfferId, OfferStatus,
    RequestFields, RequestId, RequestStatus, UserId,
};
use crate::error::WorkflowError;

#[derive(Debug, Default)]
struct Tables {
    requests: HashMap<RequestId, HelpRequest>,
    offers: HashMap<OfferId, HelperOffer>,
    matches: HashMap<MatchId, HelpMatch>,
}

/// In-memory store for all three workflow tables.
///
/// # Concurrency
///
/// - Reads are concurrent.
/// - Every transition (`accept_offer`, `complete_match`, inserts, deletes)
///   holds the write lock for its whole read-check-write sequence, so
///   concurrent callers serialize and the loser observes the winner's
///   state rather than racing it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn insert_request(
        &self,
        requester_id: UserId,
        fields: RequestFields,
    ) -> Result<HelpRequest, WorkflowError> {
        let request = HelpRequest {
            id: RequestId::new(),
            requester_id,
            status: RequestStatus::Pending,
            first_name: fields.first_name,
            last_name: fields.last_name,
            difficulty_type: fields.difficulty_type,
            floor: fields.floor,
            description: fields.description,
            created_at: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<HelpRequest>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables.requests.get(&id).cloned())
    }

    async fn list_open_requests(
        &self,
        excluding: UserId,
    ) -> Result<Vec<HelpRequest>, WorkflowError> {
        let tables = self.tables.read().await;
        let mut open: Vec<HelpRequest> = tables
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending && r.requester_id != excluding)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }

    async fn delete_request(&self, id: RequestId) -> Result<bool, WorkflowError> {
        let mut tables = self.tables.write().await;
        Ok(tables.requests.remove(&id).is_some())
    }

    async fn insert_offer_if_absent(
        &self,
        request_id: RequestId,
        helper_id: UserId,
    ) -> Result<ProposeOutcome, WorkflowError> {
        let mut tables = self.tables.write().await;

        let Some(request) = tables.requests.get(&request_id) else {
            return Err(WorkflowError::RequestNotFound(*request_id.as_uuid()));
        };
        if request.status != RequestStatus::Pending {
            return Err(WorkflowError::RequestConflict(format!(
                "request {request_id} is no longer open"
            )));
        }

        if let Some(existing) = tables
            .offers
            .values()
            .find(|o| o.request_id == request_id && o.helper_id == helper_id)
        {
            return Ok(ProposeOutcome::AlreadyProposed(existing.clone()));
        }

        let offer = HelperOffer {
            id: OfferId::new(),
            request_id,
            helper_id,
            status: OfferStatus::Pending,
            created_at: Utc::now(),
        };
        tables.offers.insert(offer.id, offer.clone());
        Ok(ProposeOutcome::Proposed(offer))
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<HelperOffer>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables.offers.get(&id).cloned())
    }

    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<HelperOffer>, WorkflowError> {
        let tables = self.tables.read().await;
        let mut offers: Vec<HelperOffer> = tables
            .offers
            .values()
            .filter(|o| o.request_id == request_id)
            .cloned()
            .collect();
        offers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(offers)
    }

    async fn latest_offer_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelperOffer>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .offers
            .values()
            .filter(|o| o.helper_id == helper_id)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn delete_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<u64, WorkflowError> {
        let mut tables = self.tables.write().await;
        let before = tables.offers.len();
        tables.offers.retain(|_, o| o.request_id != request_id);
        Ok((before - tables.offers.len()) as u64)
    }

    async fn accept_offer(&self, offer_id: OfferId) -> Result<AcceptOutcome, WorkflowError> {
        let mut tables = self.tables.write().await;

        let Some(offer) = tables.offers.get(&offer_id).cloned() else {
            return Err(WorkflowError::OfferNotFound(*offer_id.as_uuid()));
        };

        // Re-accepting an already accepted offer is idempotent: hand back
        // the match that settled it.
        if offer.status == OfferStatus::Accepted {
            let existing = tables
                .matches
                .values()
                .find(|m| m.request_id == offer.request_id)
                .cloned();
            return match existing {
                Some(m) => Ok(AcceptOutcome::AlreadyAccepted(m)),
                None => Err(WorkflowError::RequestConflict(format!(
                    "offer {offer_id} accepted but its match is gone"
                ))),
            };
        }

        // Claim the request first; this is the mutual exclusion point
        // between concurrent accepts of different offers.
        let Some(request) = tables.requests.get_mut(&offer.request_id) else {
            return Err(WorkflowError::RequestConflict(format!(
                "request {} no longer exists",
                offer.request_id
            )));
        };
        if request.status != RequestStatus::Pending {
            return Err(WorkflowError::RequestConflict(format!(
                "request {} already matched",
                offer.request_id
            )));
        }
        request.status = RequestStatus::Matched;
        let requester_id = request.requester_id;

        if let Some(stored) = tables.offers.get_mut(&offer_id) {
            stored.status = OfferStatus::Accepted;
        }

        let help_match = HelpMatch {
            id: MatchId::new(),
            request_id: offer.request_id,
            helper_id: offer.helper_id,
            requester_id,
            status: MatchStatus::Waiting,
            started_at: Utc::now(),
            ended_at: None,
        };
        tables.matches.insert(help_match.id, help_match.clone());
        Ok(AcceptOutcome::Accepted(help_match))
    }

    async fn complete_match(&self, id: MatchId) -> Result<CompletionOutcome, WorkflowError> {
        let mut tables = self.tables.write().await;
        match tables.matches.get_mut(&id) {
            Some(m) if m.status == MatchStatus::Waiting => {
                m.status = MatchStatus::Done;
                m.ended_at = Some(Utc::now());
                Ok(CompletionOutcome::Completed(m.clone()))
            }
            // Already done, or already retired by the other party.
            _ => Ok(CompletionOutcome::AlreadyCompleted),
        }
    }

    async fn find_match_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .values()
            .find(|m| m.request_id == request_id)
            .cloned())
    }

    async fn find_match_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .values()
            .filter(|m| m.helper_id == helper_id)
            .max_by_key(|m| m.started_at)
            .cloned())
    }

    async fn delete_match(&self, id: MatchId) -> Result<bool, WorkflowError> {
        let mut tables = self.tables.write().await;
        Ok(tables.matches.remove(&id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn fields() -> RequestFields {
        RequestFields {
            first_name: "Ada".to_string(),
            last_name: "L.".to_string(),
            difficulty_type: "math".to_string(),
            floor: Some("2".to_string()),
            description: "stuck on derivatives".to_string(),
        }
    }

    async fn open_request(store: &MemoryStore, requester: UserId) -> HelpRequest {
        let Ok(request) = store.insert_request(requester, fields()).await else {
            panic!("insert_request failed");
        };
        request
    }

    #[tokio::test]
    async fn propose_twice_yields_single_offer() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let helper = UserId::new();

        let Ok(first) = store.insert_offer_if_absent(request.id, helper).await else {
            panic!("first propose failed");
        };
        let Ok(second) = store.insert_offer_if_absent(request.id, helper).await else {
            panic!("second propose failed");
        };

        assert!(matches!(first, ProposeOutcome::Proposed(_)));
        let ProposeOutcome::AlreadyProposed(offer) = second else {
            panic!("expected AlreadyProposed");
        };
        assert_eq!(offer.id, first.offer().id);

        let Ok(offers) = store.list_offers_for_request(request.id).await else {
            panic!("list failed");
        };
        assert_eq!(offers.len(), 1);
    }

    #[tokio::test]
    async fn propose_on_matched_request_is_rejected() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let Ok(ProposeOutcome::Proposed(offer)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose failed");
        };
        let Ok(_) = store.accept_offer(offer.id).await else {
            panic!("accept failed");
        };

        let late = store.insert_offer_if_absent(request.id, UserId::new()).await;
        assert!(matches!(late, Err(WorkflowError::RequestConflict(_))));
    }

    #[tokio::test]
    async fn accept_creates_single_waiting_match() {
        let store = MemoryStore::new();
        let requester = UserId::new();
        let request = open_request(&store, requester).await;
        let helper = UserId::new();
        let Ok(ProposeOutcome::Proposed(offer)) =
            store.insert_offer_if_absent(request.id, helper).await
        else {
            panic!("propose failed");
        };

        let Ok(AcceptOutcome::Accepted(m)) = store.accept_offer(offer.id).await else {
            panic!("expected fresh acceptance");
        };
        assert_eq!(m.request_id, request.id);
        assert_eq!(m.helper_id, helper);
        assert_eq!(m.requester_id, requester);
        assert_eq!(m.status, MatchStatus::Waiting);
        assert!(m.ended_at.is_none());

        // The request left the open board.
        let Ok(open) = store.list_open_requests(UserId::new()).await else {
            panic!("list failed");
        };
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn accept_same_offer_twice_returns_existing_match() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let Ok(ProposeOutcome::Proposed(offer)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose failed");
        };

        let Ok(AcceptOutcome::Accepted(first)) = store.accept_offer(offer.id).await else {
            panic!("first accept failed");
        };
        let Ok(AcceptOutcome::AlreadyAccepted(second)) = store.accept_offer(offer.id).await
        else {
            panic!("expected AlreadyAccepted");
        };
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn second_offer_loses_the_accept_race() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let Ok(ProposeOutcome::Proposed(o1)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose h1 failed");
        };
        let Ok(ProposeOutcome::Proposed(o2)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose h2 failed");
        };

        let Ok(AcceptOutcome::Accepted(_)) = store.accept_offer(o1.id).await else {
            panic!("accept h1 failed");
        };
        let loser = store.accept_offer(o2.id).await;
        assert!(matches!(loser, Err(WorkflowError::RequestConflict(_))));

        // Still exactly one match for the request.
        let Ok(Some(m)) = store.find_match_for_request(request.id).await else {
            panic!("match missing");
        };
        assert_eq!(m.helper_id, o1.helper_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_accepts_produce_exactly_one_match() {
        let store = Arc::new(MemoryStore::new());
        let request = open_request(&store, UserId::new()).await;
        let Ok(ProposeOutcome::Proposed(o1)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose h1 failed");
        };
        let Ok(ProposeOutcome::Proposed(o2)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose h2 failed");
        };

        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.accept_offer(o1.id).await }),
            tokio::spawn(async move { s2.accept_offer(o2.id).await }),
        );
        let (Ok(r1), Ok(r2)) = (r1, r2) else {
            panic!("accept task panicked");
        };

        let wins = [&r1, &r2]
            .iter()
            .filter(|r| matches!(r, Ok(AcceptOutcome::Accepted(_))))
            .count();
        let conflicts = [&r1, &r2]
            .iter()
            .filter(|r| matches!(r, Err(WorkflowError::RequestConflict(_))))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn complete_is_a_cas_and_second_caller_noops() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let Ok(ProposeOutcome::Proposed(offer)) =
            store.insert_offer_if_absent(request.id, UserId::new()).await
        else {
            panic!("propose failed");
        };
        let Ok(AcceptOutcome::Accepted(m)) = store.accept_offer(offer.id).await else {
            panic!("accept failed");
        };

        let Ok(CompletionOutcome::Completed(done)) = store.complete_match(m.id).await else {
            panic!("expected Completed");
        };
        assert_eq!(done.status, MatchStatus::Done);
        assert!(done.ended_at.is_some());

        let Ok(CompletionOutcome::AlreadyCompleted) = store.complete_match(m.id).await else {
            panic!("expected AlreadyCompleted");
        };
    }

    #[tokio::test]
    async fn complete_on_missing_match_noops() {
        let store = MemoryStore::new();
        let outcome = store.complete_match(MatchId::new()).await;
        assert!(matches!(outcome, Ok(CompletionOutcome::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn open_board_excludes_own_requests() {
        let store = MemoryStore::new();
        let me = UserId::new();
        let _mine = open_request(&store, me).await;
        let theirs = open_request(&store, UserId::new()).await;

        let Ok(open) = store.list_open_requests(me).await else {
            panic!("list failed");
        };
        assert_eq!(open.len(), 1);
        let Some(first) = open.first() else {
            panic!("empty board");
        };
        assert_eq!(first.id, theirs.id);
    }

    #[tokio::test]
    async fn open_board_orders_newest_first() {
        let store = MemoryStore::new();
        let _older = open_request(&store, UserId::new()).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = open_request(&store, UserId::new()).await;

        let Ok(open) = store.list_open_requests(UserId::new()).await else {
            panic!("list failed");
        };
        let Some(first) = open.first() else {
            panic!("empty board");
        };
        assert_eq!(first.id, newer.id);
    }

    #[tokio::test]
    async fn latest_offer_picks_most_recent() {
        let store = MemoryStore::new();
        let helper = UserId::new();
        let r1 = open_request(&store, UserId::new()).await;
        let r2 = open_request(&store, UserId::new()).await;

        let Ok(_) = store.insert_offer_if_absent(r1.id, helper).await else {
            panic!("propose 1 failed");
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let Ok(ProposeOutcome::Proposed(newer)) =
            store.insert_offer_if_absent(r2.id, helper).await
        else {
            panic!("propose 2 failed");
        };

        let Ok(Some(latest)) = store.latest_offer_for_helper(helper).await else {
            panic!("latest missing");
        };
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn delete_offers_for_request_counts_rows() {
        let store = MemoryStore::new();
        let request = open_request(&store, UserId::new()).await;
        let Ok(_) = store.insert_offer_if_absent(request.id, UserId::new()).await else {
            panic!("propose 1 failed");
        };
        let Ok(_) = store.insert_offer_if_absent(request.id, UserId::new()).await else {
            panic!("propose 2 failed");
        };

        let Ok(removed) = store.delete_offers_for_request(request.id).await else {
            panic!("delete failed");
        };
        assert_eq!(removed, 2);
    }
}
