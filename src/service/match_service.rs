//! Match service: orchestrates workflow transitions and emits events.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{
    EventBus, HelpMatch, HelpRequest, HelperOffer, MatchEvent, MatchId, OfferId, RequestFields,
    RequestId, RequestStatus, UserId,
};
use crate::error::WorkflowError;
use crate::poll::{PollHandle, Poller};
use crate::store::{AcceptOutcome, CompletionOutcome, ProposeOutcome, WorkflowStore};

/// Orchestration layer for the request → offer → match lifecycle.
///
/// Stateless coordinator: owns a [`WorkflowStore`] for state and an
/// [`EventBus`] for change notification. Every mutation method follows
/// the pattern: apply the store transition → emit events → return result.
/// Atomicity of the transitions themselves lives in the store; this layer
/// adds ownership checks, validation, and best-effort cleanup.
#[derive(Debug, Clone)]
pub struct MatchService {
    store: Arc<dyn WorkflowStore>,
    event_bus: EventBus,
}

impl MatchService {
    /// Creates a new `MatchService`.
    #[must_use]
    pub fn new(store: Arc<dyn WorkflowStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Creates a new pending help request and announces it on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidRequest`] if the requester ID is nil
    /// or a required field is empty, [`WorkflowError::Store`] on store
    /// failure.
    pub async fn create_request(
        &self,
        requester_id: UserId,
        fields: RequestFields,
    ) -> Result<HelpRequest, WorkflowError> {
        if requester_id.as_uuid().is_nil() {
            return Err(WorkflowError::InvalidRequest(
                "requester id missing".to_string(),
            ));
        }
        for (name, value) in [
            ("first_name", &fields.first_name),
            ("last_name", &fields.last_name),
            ("difficulty_type", &fields.difficulty_type),
            ("description", &fields.description),
        ] {
            if value.trim().is_empty() {
                return Err(WorkflowError::InvalidRequest(format!("{name} is required")));
            }
        }

        let request = self.store.insert_request(requester_id, fields).await?;

        let _ = self.event_bus.publish(MatchEvent::RequestOpened {
            request_id: request.id,
            requester_id,
            difficulty_type: request.difficulty_type.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(request_id = %request.id, "help request opened");
        Ok(request)
    }

    /// Returns the open request board for a helper: pending requests,
    /// newest first, never the caller's own.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    pub async fn open_board(&self, excluding: UserId) -> Result<Vec<HelpRequest>, WorkflowError> {
        self.store.list_open_requests(excluding).await
    }

    /// Fetches a single request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::RequestNotFound`] if it does not exist,
    /// [`WorkflowError::Store`] on store failure.
    pub async fn get_request(&self, id: RequestId) -> Result<HelpRequest, WorkflowError> {
        self.store
            .get_request(id)
            .await?
            .ok_or(WorkflowError::RequestNotFound(*id.as_uuid()))
    }

    /// Withdraws a pending request. Only its requester may do this, and
    /// only before a match exists. The request's offers are retired with
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::RequestNotFound`], [`WorkflowError::Forbidden`]
    /// for a non-owner, [`WorkflowError::RequestConflict`] once matched, or
    /// [`WorkflowError::Store`] on store failure.
    pub async fn withdraw_request(
        &self,
        id: RequestId,
        requester_id: UserId,
    ) -> Result<(), WorkflowError> {
        let request = self.get_request(id).await?;
        if request.requester_id != requester_id {
            return Err(WorkflowError::Forbidden(
                "only the requester may withdraw a request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(WorkflowError::RequestConflict(format!(
                "request {id} already matched"
            )));
        }

        self.store.delete_request(id).await?;
        if let Err(e) = self.store.delete_offers_for_request(id).await {
            tracing::warn!(request_id = %id, error = %e, "offer cleanup failed on withdraw");
        }

        let _ = self.event_bus.publish(MatchEvent::RequestWithdrawn {
            request_id: id,
            timestamp: Utc::now(),
        });

        tracing::info!(request_id = %id, "help request withdrawn");
        Ok(())
    }

    /// Volunteers a helper for a request. Idempotent: a repeated propose
    /// returns the existing offer and emits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidRequest`] when a requester proposes
    /// on their own request, [`WorkflowError::RequestNotFound`] /
    /// [`WorkflowError::RequestConflict`] for a missing or already-matched
    /// request, or [`WorkflowError::Store`] on store failure.
    pub async fn propose_help(
        &self,
        request_id: RequestId,
        helper_id: UserId,
    ) -> Result<ProposeOutcome, WorkflowError> {
        let request = self.get_request(request_id).await?;
        if request.requester_id == helper_id {
            return Err(WorkflowError::InvalidRequest(
                "cannot volunteer for an own request".to_string(),
            ));
        }

        let outcome = self
            .store
            .insert_offer_if_absent(request_id, helper_id)
            .await?;

        if let ProposeOutcome::Proposed(offer) = &outcome {
            let _ = self.event_bus.publish(MatchEvent::OfferProposed {
                request_id,
                offer_id: offer.id,
                helper_id,
                timestamp: Utc::now(),
            });
            tracing::info!(request_id = %request_id, offer_id = %offer.id, "help offered");
        }
        Ok(outcome)
    }

    /// Lists the offers a request has received, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    pub async fn offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<HelperOffer>, WorkflowError> {
        self.store.list_offers_for_request(request_id).await
    }

    /// Returns the helper's most recent offer, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    pub async fn latest_offer(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelperOffer>, WorkflowError> {
        self.store.latest_offer_for_helper(helper_id).await
    }

    /// Accepts an offer on behalf of `caller`, who must own the request.
    ///
    /// The store transition claims the request, flips the offer, and
    /// creates the waiting match atomically; a concurrent accept of a
    /// different offer surfaces as [`WorkflowError::RequestConflict`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::OfferNotFound`], [`WorkflowError::Forbidden`]
    /// for a non-owner, [`WorkflowError::RequestConflict`] when the request
    /// is already claimed, or [`WorkflowError::Store`] on store failure.
    pub async fn accept_offer(
        &self,
        offer_id: OfferId,
        caller: UserId,
    ) -> Result<AcceptOutcome, WorkflowError> {
        let offer = self
            .store
            .get_offer(offer_id)
            .await?
            .ok_or(WorkflowError::OfferNotFound(*offer_id.as_uuid()))?;
        let request = self
            .store
            .get_request(offer.request_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::RequestConflict(format!(
                    "request {} no longer exists",
                    offer.request_id
                ))
            })?;
        if request.requester_id != caller {
            return Err(WorkflowError::Forbidden(
                "only the requester may accept an offer".to_string(),
            ));
        }

        let outcome = self.store.accept_offer(offer_id).await?;

        if let AcceptOutcome::Accepted(m) = &outcome {
            let _ = self.event_bus.publish(MatchEvent::MatchStarted {
                request_id: m.request_id,
                offer_id,
                match_id: m.id,
                helper_id: m.helper_id,
                requester_id: m.requester_id,
                timestamp: Utc::now(),
            });
            tracing::info!(match_id = %m.id, request_id = %m.request_id, "match started");
        }
        Ok(outcome)
    }

    /// Finishes a match from either side.
    ///
    /// The store transition is a compare-and-swap on the match status, so
    /// when both parties finish inside the same poll window exactly one of
    /// them observes [`CompletionOutcome::Completed`]; the other gets
    /// [`CompletionOutcome::AlreadyCompleted`] and must treat it as
    /// success. Row cleanup (match, request, offers) is best-effort: a
    /// failure is logged and swallowed, never surfaced to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] only if the status transition
    /// itself fails.
    pub async fn complete_match(
        &self,
        match_id: MatchId,
    ) -> Result<CompletionOutcome, WorkflowError> {
        let outcome = self.store.complete_match(match_id).await?;

        if let CompletionOutcome::Completed(m) = &outcome {
            if let Err(e) = self.store.delete_match(m.id).await {
                tracing::warn!(match_id = %m.id, error = %e, "match cleanup failed");
            }
            if let Err(e) = self.store.delete_request(m.request_id).await {
                tracing::warn!(request_id = %m.request_id, error = %e, "request cleanup failed");
            }
            if let Err(e) = self.store.delete_offers_for_request(m.request_id).await {
                tracing::warn!(request_id = %m.request_id, error = %e, "offer cleanup failed");
            }

            let _ = self.event_bus.publish(MatchEvent::MatchCompleted {
                request_id: m.request_id,
                match_id: m.id,
                timestamp: Utc::now(),
            });
            tracing::info!(match_id = %m.id, "match completed");
        }
        Ok(outcome)
    }

    /// Fetches the match settling a request, if one exists. Drives the
    /// requester-side transition to the in-session screen.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    pub async fn match_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        self.store.find_match_for_request(request_id).await
    }

    /// Fetches the helper's current match, if one exists. Drives the
    /// helper-side acceptance watch.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    pub async fn match_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        self.store.find_match_for_helper(helper_id).await
    }

    /// Spawns the polling fallback for the open request board.
    #[must_use]
    pub fn watch_board(
        self: Arc<Self>,
        excluding: UserId,
        interval: Duration,
    ) -> PollHandle<Vec<HelpRequest>> {
        Poller::spawn(interval, move || {
            let service = Arc::clone(&self);
            async move { service.open_board(excluding).await }
        })
    }

    /// Spawns the polling fallback for a requester watching offers arrive.
    #[must_use]
    pub fn watch_offers(
        self: Arc<Self>,
        request_id: RequestId,
        interval: Duration,
    ) -> PollHandle<Vec<HelperOffer>> {
        Poller::spawn(interval, move || {
            let service = Arc::clone(&self);
            async move { service.offers_for_request(request_id).await }
        })
    }

    /// Spawns the polling fallback for a helper watching for acceptance.
    #[must_use]
    pub fn watch_acceptance(
        self: Arc<Self>,
        helper_id: UserId,
        interval: Duration,
    ) -> PollHandle<Option<HelpMatch>> {
        Poller::spawn(interval, move || {
            let service = Arc::clone(&self);
            async move { service.match_for_helper(helper_id).await }
        })
    }
}
