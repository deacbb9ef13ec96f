//! PostgreSQL implementation of the workflow store.
//!
//! Transitions that the original clients ran as separate read-then-write
//! calls are single transactions here, with conditional `UPDATE … WHERE
//! status = …` writes and an `ON CONFLICT DO NOTHING` insert keyed by the
//! unique index on `matches.request_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AcceptOutcome, CompletionOutcome, ProposeOutcome, WorkflowStore};
use crate::domain::{
    HelpMatch, HelpRequest, HelperOffer, MatchId, MatchStatus, OfferId, OfferStatus,
    RequestFields, RequestId, RequestStatus, UserId,
};
use crate::error::WorkflowError;

type RequestRow = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
);

type OfferRow = (Uuid, Uuid, Uuid, String, DateTime<Utc>);

type MatchRow = (
    Uuid,
    Uuid,
    Uuid,
    Uuid,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const SELECT_REQUEST: &str = "SELECT id, requester_id, status, first_name, last_name, \
     difficulty_type, floor, description, created_at FROM help_requests";

const SELECT_OFFER: &str =
    "SELECT id, request_id, helper_id, status, created_at FROM helper_offers";

const SELECT_MATCH: &str = "SELECT id, request_id, helper_id, requester_id, status, \
     started_at, ended_at FROM matches";

/// PostgreSQL-backed workflow store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(e: sqlx::Error) -> WorkflowError {
    WorkflowError::Store(e.to_string())
}

fn request_from_row(row: RequestRow) -> Result<HelpRequest, WorkflowError> {
    let (id, requester_id, status, first_name, last_name, difficulty_type, floor, description, created_at) =
        row;
    let status = RequestStatus::parse(&status)
        .ok_or_else(|| WorkflowError::Store(format!("unknown request status: {status}")))?;
    Ok(HelpRequest {
        id: RequestId::from_uuid(id),
        requester_id: UserId::from_uuid(requester_id),
        status,
        first_name,
        last_name,
        difficulty_type,
        floor,
        description,
        created_at,
    })
}

fn offer_from_row(row: OfferRow) -> Result<HelperOffer, WorkflowError> {
    let (id, request_id, helper_id, status, created_at) = row;
    let status = OfferStatus::parse(&status)
        .ok_or_else(|| WorkflowError::Store(format!("unknown offer status: {status}")))?;
    Ok(HelperOffer {
        id: OfferId::from_uuid(id),
        request_id: RequestId::from_uuid(request_id),
        helper_id: UserId::from_uuid(helper_id),
        status,
        created_at,
    })
}

fn match_from_row(row: MatchRow) -> Result<HelpMatch, WorkflowError> {
    let (id, request_id, helper_id, requester_id, status, started_at, ended_at) = row;
    let status = MatchStatus::parse(&status)
        .ok_or_else(|| WorkflowError::Store(format!("unknown match status: {status}")))?;
    Ok(HelpMatch {
        id: MatchId::from_uuid(id),
        request_id: RequestId::from_uuid(request_id),
        helper_id: UserId::from_uuid(helper_id),
        requester_id: UserId::from_uuid(requester_id),
        status,
        started_at,
        ended_at,
    })
}

#[async_trait]
impl WorkflowStore for PostgresStore {
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

        sqlx::query(
            "INSERT INTO help_requests \
             (id, requester_id, status, first_name, last_name, difficulty_type, floor, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(request.id.as_uuid())
        .bind(request.requester_id.as_uuid())
        .bind(request.status.as_str())
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.difficulty_type)
        .bind(&request.floor)
        .bind(&request.description)
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(request)
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<HelpRequest>, WorkflowError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!("{SELECT_REQUEST} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(request_from_row).transpose()
    }

    async fn list_open_requests(
        &self,
        excluding: UserId,
    ) -> Result<Vec<HelpRequest>, WorkflowError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "{SELECT_REQUEST} WHERE status = 'pending' AND requester_id <> $1 \
             ORDER BY created_at DESC"
        ))
        .bind(excluding.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(request_from_row).collect()
    }

    async fn delete_request(&self, id: RequestId) -> Result<bool, WorkflowError> {
        let result = sqlx::query("DELETE FROM help_requests WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_offer_if_absent(
        &self,
        request_id: RequestId,
        helper_id: UserId,
    ) -> Result<ProposeOutcome, WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM help_requests WHERE id = $1")
                .bind(request_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;
        match status {
            None => return Err(WorkflowError::RequestNotFound(*request_id.as_uuid())),
            Some((s,)) if s != RequestStatus::Pending.as_str() => {
                return Err(WorkflowError::RequestConflict(format!(
                    "request {request_id} is no longer open"
                )));
            }
            Some(_) => {}
        }

        let offer = HelperOffer {
            id: OfferId::new(),
            request_id,
            helper_id,
            status: OfferStatus::Pending,
            created_at: Utc::now(),
        };
        let inserted = sqlx::query(
            "INSERT INTO helper_offers (id, request_id, helper_id, status, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (request_id, helper_id) DO NOTHING",
        )
        .bind(offer.id.as_uuid())
        .bind(offer.request_id.as_uuid())
        .bind(offer.helper_id.as_uuid())
        .bind(offer.status.as_str())
        .bind(offer.created_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if inserted.rows_affected() > 0 {
            tx.commit().await.map_err(store_err)?;
            return Ok(ProposeOutcome::Proposed(offer));
        }

        let existing = sqlx::query_as::<_, OfferRow>(&format!(
            "{SELECT_OFFER} WHERE request_id = $1 AND helper_id = $2"
        ))
        .bind(request_id.as_uuid())
        .bind(helper_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        Ok(ProposeOutcome::AlreadyProposed(offer_from_row(existing)?))
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<HelperOffer>, WorkflowError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!("{SELECT_OFFER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(offer_from_row).transpose()
    }

    async fn list_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<HelperOffer>, WorkflowError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "{SELECT_OFFER} WHERE request_id = $1 ORDER BY created_at ASC"
        ))
        .bind(request_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(offer_from_row).collect()
    }

    async fn latest_offer_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelperOffer>, WorkflowError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "{SELECT_OFFER} WHERE helper_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(helper_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(offer_from_row).transpose()
    }

    async fn delete_offers_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<u64, WorkflowError> {
        let result = sqlx::query("DELETE FROM helper_offers WHERE request_id = $1")
            .bind(request_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }

    async fn accept_offer(&self, offer_id: OfferId) -> Result<AcceptOutcome, WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query_as::<_, OfferRow>(&format!("{SELECT_OFFER} WHERE id = $1"))
            .bind(offer_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?;
        let Some(row) = row else {
            return Err(WorkflowError::OfferNotFound(*offer_id.as_uuid()));
        };
        let offer = offer_from_row(row)?;

        if offer.status == OfferStatus::Accepted {
            let existing = sqlx::query_as::<_, MatchRow>(&format!(
                "{SELECT_MATCH} WHERE request_id = $1"
            ))
            .bind(offer.request_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?;
            tx.commit().await.map_err(store_err)?;
            return match existing {
                Some(m) => Ok(AcceptOutcome::AlreadyAccepted(match_from_row(m)?)),
                None => Err(WorkflowError::RequestConflict(format!(
                    "offer {offer_id} accepted but its match is gone"
                ))),
            };
        }

        // Claim the request first. Zero rows means a concurrent accept of
        // another offer got here before us, or the request was withdrawn.
        let claimed: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE help_requests SET status = 'matched' WHERE id = $1 AND status = 'pending' \
             RETURNING requester_id",
        )
        .bind(offer.request_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;
        let Some((requester_id,)) = claimed else {
            return Err(WorkflowError::RequestConflict(format!(
                "request {} already matched or withdrawn",
                offer.request_id
            )));
        };

        sqlx::query("UPDATE helper_offers SET status = 'accepted' WHERE id = $1")
            .bind(offer.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        // The unique index on request_id is the backstop; inside this
        // transaction the claim above already serialized us.
        let match_id = MatchId::new();
        let started_at = Utc::now();
        sqlx::query(
            "INSERT INTO matches (id, request_id, helper_id, requester_id, status, started_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (request_id) DO NOTHING",
        )
        .bind(match_id.as_uuid())
        .bind(offer.request_id.as_uuid())
        .bind(offer.helper_id.as_uuid())
        .bind(requester_id)
        .bind(MatchStatus::Waiting.as_str())
        .bind(started_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let row = sqlx::query_as::<_, MatchRow>(&format!("{SELECT_MATCH} WHERE request_id = $1"))
            .bind(offer.request_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        Ok(AcceptOutcome::Accepted(match_from_row(row)?))
    }

    async fn complete_match(&self, id: MatchId) -> Result<CompletionOutcome, WorkflowError> {
        let row = sqlx::query_as::<_, MatchRow>(
            "UPDATE matches SET status = 'done', ended_at = $2 \
             WHERE id = $1 AND status = 'waiting' \
             RETURNING id, request_id, helper_id, requester_id, status, started_at, ended_at",
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        match row {
            Some(row) => Ok(CompletionOutcome::Completed(match_from_row(row)?)),
            None => Ok(CompletionOutcome::AlreadyCompleted),
        }
    }

    async fn find_match_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!("{SELECT_MATCH} WHERE request_id = $1"))
            .bind(request_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.map(match_from_row).transpose()
    }

    async fn find_match_for_helper(
        &self,
        helper_id: UserId,
    ) -> Result<Option<HelpMatch>, WorkflowError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "{SELECT_MATCH} WHERE helper_id = $1 ORDER BY started_at DESC LIMIT 1"
        ))
        .bind(helper_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(match_from_row).transpose()
    }

    async fn delete_match(&self, id: MatchId) -> Result<bool, WorkflowError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }
}
