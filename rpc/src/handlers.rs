//! RPC request handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use runoff_election::{ElectionError, ElectionResults, ElectionService, WinnerReport};
use runoff_store::Store;
use runoff_types::{Candidate, CandidateId, Election, ElectionId, Identity, Timestamp};

use crate::error::RpcError;
use crate::extract::Caller;
use crate::pagination::{PaginationMeta, PaginationParams};
use crate::server::RpcState;

// ── Views ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ElectionView {
    #[serde(flatten)]
    pub election: Election,
    pub status: &'static str,
    pub seconds_until_start: u64,
    pub seconds_remaining: u64,
}

impl ElectionView {
    fn at(election: Election, now: Timestamp) -> Self {
        Self {
            status: election.status(now).as_str(),
            seconds_until_start: election.start_time.secs_until(now),
            seconds_remaining: election.end_time.secs_until(now),
            election,
        }
    }
}

// ── Elections ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateElectionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_secs: u64,
}

#[derive(Serialize)]
pub struct ElectionListResponse {
    pub elections: Vec<ElectionView>,
    #[serde(flatten)]
    pub pagination: PaginationMeta,
}

#[derive(Serialize)]
pub struct ActiveResponse {
    pub election_id: ElectionId,
    pub active: bool,
}

#[derive(Serialize)]
pub struct VotedResponse {
    pub election_id: ElectionId,
    pub identity: Identity,
    pub voted: bool,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<ElectionId>,
}

#[derive(Serialize)]
pub struct FinalizeResponse {
    pub election: ElectionView,
    pub requires_runoff: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runoff_election_id: Option<ElectionId>,
}

pub async fn create_election<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
    Json(req): Json<CreateElectionRequest>,
) -> Result<(StatusCode, Json<ElectionView>), RpcError> {
    let now = state.now();
    let election = blocking(&state, move |svc| {
        svc.create_election(&caller, &req.title, &req.description, req.duration_secs, now)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ElectionView::at(election, now))))
}

pub async fn list_elections<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ElectionListResponse>, RpcError> {
    let now = state.now();
    let all = blocking(&state, |svc| svc.list_elections()).await?;
    let (page, cursor) = params.page(all, |e| e.id.get());
    Ok(Json(ElectionListResponse {
        elections: page.into_iter().map(|e| ElectionView::at(e, now)).collect(),
        pagination: PaginationMeta { cursor },
    }))
}

pub async fn get_election<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<ElectionId>,
) -> Result<Json<ElectionView>, RpcError> {
    let now = state.now();
    let election = blocking(&state, move |svc| svc.get_election(id)).await?;
    Ok(Json(ElectionView::at(election, now)))
}

pub async fn get_results<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<ElectionId>,
) -> Result<Json<ElectionResults>, RpcError> {
    Ok(Json(blocking(&state, move |svc| svc.get_election_results(id)).await?))
}

pub async fn get_winner<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<ElectionId>,
) -> Result<Json<WinnerReport>, RpcError> {
    Ok(Json(blocking(&state, move |svc| svc.get_winner(id)).await?))
}

pub async fn is_active<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<ElectionId>,
) -> Result<Json<ActiveResponse>, RpcError> {
    let now = state.now();
    let active = blocking(&state, move |svc| svc.is_election_active(id, now)).await?;
    Ok(Json(ActiveResponse {
        election_id: id,
        active,
    }))
}

pub async fn has_voted<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
    Path(id): Path<ElectionId>,
) -> Result<Json<VotedResponse>, RpcError> {
    let identity = caller.clone();
    let voted = blocking(&state, move |svc| svc.has_user_voted(&caller, id)).await?;
    Ok(Json(VotedResponse {
        election_id: id,
        identity,
        voted,
    }))
}

pub async fn runoff_chain<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<ElectionId>,
) -> Result<Json<ChainResponse>, RpcError> {
    let chain = blocking(&state, move |svc| svc.runoff_chain(id)).await?;
    Ok(Json(ChainResponse { chain }))
}

pub async fn finalize<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
    Path(id): Path<ElectionId>,
) -> Result<Json<FinalizeResponse>, RpcError> {
    let now = state.now();
    let outcome = blocking(&state, move |svc| svc.finalize_election(&caller, id, now)).await?;
    Ok(Json(FinalizeResponse {
        requires_runoff: outcome.requires_runoff(),
        runoff_election_id: outcome.runoff.as_ref().map(|r| r.election.id),
        election: ElectionView::at(outcome.election, now),
    }))
}

// ── Candidates ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddCandidateRequest {
    pub name: String,
}

pub async fn add_candidate<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
    Path(id): Path<ElectionId>,
    Json(req): Json<AddCandidateRequest>,
) -> Result<(StatusCode, Json<Candidate>), RpcError> {
    let candidate = blocking(&state, move |svc| svc.add_candidate(&caller, id, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Path(id): Path<CandidateId>,
) -> Result<Json<Candidate>, RpcError> {
    Ok(Json(blocking(&state, move |svc| svc.get_candidate(id)).await?))
}

// ── Voting ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RegisterResponse {
    pub identity: Identity,
    pub registered: bool,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub accepted: bool,
}

pub async fn register<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
) -> Result<(StatusCode, Json<RegisterResponse>), RpcError> {
    let identity = caller.clone();
    blocking(&state, move |svc| svc.register_to_vote(&caller)).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            identity,
            registered: true,
        }),
    ))
}

pub async fn vote<S: Store + 'static>(
    State(state): State<RpcState<S>>,
    Caller(caller): Caller,
    Path(id): Path<ElectionId>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, RpcError> {
    let now = state.now();
    let candidate = req.candidate_id;
    blocking(&state, move |svc| svc.vote(&caller, id, candidate, now)).await?;
    Ok(Json(VoteResponse {
        election_id: id,
        candidate_id: candidate,
        accepted: true,
    }))
}

/// Run a ledger call on the blocking pool; storage transactions may wait on the writer lock.
async fn blocking<S, R, F>(state: &RpcState<S>, f: F) -> Result<R, RpcError>
where
    S: Store + 'static,
    R: Send + 'static,
    F: FnOnce(&ElectionService<S>) -> Result<R, ElectionError> + Send + 'static,
{
    let service: Arc<ElectionService<S>> = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| RpcError::Server(format!("ledger task failed: {e}")))?
        .map_err(RpcError::from)
}
