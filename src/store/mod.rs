//! Shared workflow store behind narrow repository interfaces.
//!
//! All three entity tables are globally shared and mutated by many
//! independent clients, so every lifecycle transition that used to be a
//! read-then-write in the clients is a single conditional write here:
//! either it observes the expected prior state and applies, or it affects
//! zero rows and reports the fact as a typed outcome instead of clobbering
//! a peer's transition.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{
    HelpMatch, HelpRequest, HelperOffer, MatchId, OfferId, RequestFields, RequestId, UserId,
};
use crate::error::WorkflowError;

/// Result of a propose-help call.
#[derive(Debug, Clone)]
pub enum ProposeOutcome {
    /// A fresh pending offer was inserted.
    Proposed(HelperOffer),
    /// This helper already has an offer for the request; no row was added.
    AlreadyProposed(HelperOffer),
}

impl ProposeOutcome {
    /// Returns the offer regardless of whether it was just inserted.
    #[must_use]
    pub fn offer(&self) -> &HelperOffer {
        match self {
            Self::Proposed(offer) | Self::AlreadyProposed(offer) => offer,
        }
    }
}

/// Result of an accept-offer transition.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    /// The offer was accepted and a waiting match created.
    Accepted(HelpMatch),
    /// The offer had already been accepted; the existing match is returned.
    AlreadyAccepted(HelpMatch),
}

impl AcceptOutcome {
    /// Returns the match regardless of which path produced it.
    #[must_use]
    pub fn help_match(&self) -> &HelpMatch {
        match self {
            Self::Accepted(m) | Self::AlreadyAccepted(m) => m,
        }
    }
}

/// Result of a complete-match transition.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// This caller won the transition; the finished match is returned so
    /// its rows can be retired.
    Completed(HelpMatch),
    /// The match was already completed (or already retired) by the other
    /// party. Strictly a no-op for this caller.
    AlreadyCompleted,
}

/// Repository interface over the shared workflow tables.
///
/// Implementations must make [`accept_offer`](WorkflowStore::accept_offer)
/// and [`complete_match`](WorkflowStore::complete_match) atomic with
/// respect to concurrent callers: the former claims the request before
/// touching the offer or match rows, the latter is a compare-and-swap on
/// the match status.
#[async_trait]
pub trait WorkflowStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new pending help request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn insert_request(
        &self,
        requester_id: UserId,
        fields: RequestFields,
    ) -> Result<HelpRequest, WorkflowError>;

    /// Fetches a request by ID.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn get_request(&self, id: RequestId) -> Result<Option<HelpRequest>, WorkflowError>;

    /// Lists pending requests, newest first, excluding those posted by
    /// `excluding`. Matched requests are never returned.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn list_open_requests(
        &self,
        excluding: UserId,
    ) -> Result<Vec<HelpRequest>, WorkflowError>;

    /// Deletes a request row. Returns `false` if no row existed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn delete_request(&self, id: RequestId) -> Result<bool, WorkflowError>;

    /// Inserts a pending offer unless this helper already has one for the
    /// request, in which case the existing offer is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::RequestNotFound`] if the request does not
    /// exist, [`WorkflowError::RequestConflict`] if it is no longer
    /// pending, or [`WorkflowError::Store`] on store failure.
    async fn insert_offer_if_absent(
        &self,
        request_id: RequestId,
        helper_id: UserId,
    ) -> Result<ProposeOutcome, WorkflowError>;

    /// Fetches an offer by ID.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn get_offer(&self, id: OfferId) -> Result<Option<HelperOffer>, WorkflowError>;

    /// Lists all offers targeting a request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<HelperOffer>, WorkflowError>;

    /// Returns the helper's most recent offer, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn latest_offer_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelperOffer>, WorkflowError>;

    /// Deletes all offers targeting a request, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn delete_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<u64, WorkflowError>;

    /// Accepts an offer: claims the request (`pending → matched`), flips
    /// the offer (`pending → accepted`), and creates the match if absent,
    /// all as one atomic transition.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::OfferNotFound`] if the offer does not
    /// exist, [`WorkflowError::RequestConflict`] if the request was
    /// already claimed through a different offer (or deleted), or
    /// [`WorkflowError::Store`] on store failure.
    async fn accept_offer(&self, offer_id: OfferId) -> Result<AcceptOutcome, WorkflowError>;

    /// Compare-and-swaps the match `waiting → done`, stamping `ended_at`.
    /// Zero rows affected means the other party finished first; that is
    /// reported as [`CompletionOutcome::AlreadyCompleted`], never an error.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn complete_match(&self, id: MatchId) -> Result<CompletionOutcome, WorkflowError>;

    /// Fetches the match settling a request, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn find_match_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<HelpMatch>, WorkflowError>;

    /// Fetches the helper's current match, if one exists. When several
    /// exist the most recently started is returned.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn find_match_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelpMatch>, WorkflowError>;

    /// Deletes a match row. Returns `false` if no row existed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] on store failure.
    async fn delete_match(&self, id: MatchId) -> Result<bool, WorkflowError>;
}
