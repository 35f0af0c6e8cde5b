use std::time::Duration;

use derive_more::Display;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cluster::{AuditTrail, MemberRef, VoteResponse};
use crate::common::cancel_after;
use crate::common::completion_pipe::CompletionPipe;
use crate::errors::{ErrorKind, RaftError, Result};
use crate::leadership::state::RaftState;
use crate::leadership::status::administrator::RaftElections;
use crate::leadership::{Term, UNAVAILABLE_TERM};

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum VotingResult {
    Rejected,
    Granted,
    Canceled,
    NotAvailable,
}

#[derive(Debug)]
struct Vote {
    member: MemberRef,
    term: Term,
    result: VotingResult,
}

/// A single election attempt for a fixed term.
pub struct CandidateState<Re: RaftElections> {
    state: RaftState<Re>,
    term: Term,
    voting_cancellation: CancellationToken,
    voting_task: Option<JoinHandle<()>>,
}

impl<Re: RaftElections> CandidateState<Re> {
    pub fn new(state: RaftState<Re>, term: Term) -> CandidateState<Re> {
        CandidateState {
            state,
            term,
            voting_cancellation: CancellationToken::new(),
            voting_task: None,
        }
    }

    pub fn term(&self) -> Term {
        self.term
    }

    /// Requests votes from every member in parallel and tallies them as they arrive.
    /// Voting is abandoned once `timeout` elapses.
    pub fn start_voting<Log: AuditTrail>(
        &mut self,
        timeout: Duration,
        members: Vec<MemberRef>,
        audit_trail: Log,
    ) -> Result<()> {
        info!("Voting started with timeout {:?} for term {}", timeout, self.term);

        let voters = CompletionPipe::with_capacity(members.len());
        for member in members {
            voters.add(request_vote(
                member,
                self.term,
                audit_trail.clone(),
                self.voting_cancellation.clone(),
            ))?;
        }
        voters.complete();

        cancel_after(&self.voting_cancellation, timeout);
        self.voting_task = Some(tokio::spawn(end_voting(
            self.state.clone(),
            self.term,
            voters,
            self.voting_cancellation.clone(),
        )));

        Ok(())
    }

    pub async fn dispose(mut self) {
        self.state.begin_dispose();
        self.voting_cancellation.cancel();

        if let Some(voting_task) = self.voting_task.take() {
            if let Err(err) = voting_task.await {
                error!("Candidate state exited with error: {}", err);
            }
        }
    }
}

impl<Re: RaftElections> Drop for CandidateState<Re> {
    fn drop(&mut self) {
        self.voting_cancellation.cancel();
    }
}

impl<Re: RaftElections> std::fmt::Debug for CandidateState<Re> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateState")
            .field("generation", &self.state.generation())
            .field("term", &self.term)
            .field("voting", &self.voting_task.is_some())
            .finish()
    }
}

async fn request_vote<Log: AuditTrail>(
    member: MemberRef,
    term: Term,
    audit_trail: Log,
    token: CancellationToken,
) -> Vote {
    // cancellation wins even if the member ignores the token
    let response = tokio::select! {
        _ = token.cancelled() => Err(RaftError::canceled("Vote request canceled")),
        response = ask_member(&member, term, &audit_trail, &token) => response,
    };

    let (term, result) = match response {
        Ok(response) if response.vote_granted => (response.term, VotingResult::Granted),
        Ok(response) => (response.term, VotingResult::Rejected),
        Err(err) if err.kind() == ErrorKind::Canceled => (term, VotingResult::Canceled),
        Err(err) => {
            trace!("Vote request to {} failed: {}", member.endpoint(), err);
            (UNAVAILABLE_TERM, VotingResult::NotAvailable)
        }
    };

    Vote { member, term, result }
}

async fn ask_member<Log: AuditTrail>(
    member: &MemberRef,
    term: Term,
    audit_trail: &Log,
    token: &CancellationToken,
) -> Result<VoteResponse> {
    let last_index = audit_trail.last_uncommitted_index();
    let last_term = audit_trail.term_at(last_index, token).await?;

    member.vote(term, last_index, last_term, token).await
}

async fn end_voting<Re: RaftElections>(
    state: RaftState<Re>,
    term: Term,
    voters: CompletionPipe<Vote>,
    voting_cancellation: CancellationToken,
) {
    let mut votes: i64 = 0;
    let mut local_member = None;
    let mut consumer = voters.consumer();

    while let Some(vote) = consumer.next().await {
        if state.is_disposing() {
            return;
        }

        if vote.term > term {
            info!(
                "Member {} reported term {} greater than election term {}",
                vote.member.endpoint(),
                vote.term,
                term
            );
            state.move_to_follower_state(false, Some(vote.term));
            return;
        }

        match vote.result {
            VotingResult::Canceled => {
                info!("Voting for term {} timed out", term);
                state.move_to_follower_state(false, None);
                return;
            }
            VotingResult::Granted => {
                debug!("Vote granted by {}", vote.member.endpoint());
                votes += 1;
            }
            VotingResult::Rejected => {
                debug!("Vote rejected by {}", vote.member.endpoint());
                votes -= 1;
            }
            VotingResult::NotAvailable => {
                warn!("Cluster member {} is unavailable", vote.member.endpoint());
                votes -= 1;
            }
        }

        if !vote.member.is_remote() {
            local_member = Some(vote.member);
        }
    }

    if state.is_disposing() {
        return;
    }

    info!("Voting completed with {} net votes for term {}", votes, term);
    match local_member {
        Some(local_member) if votes > 0 && !voting_cancellation.is_cancelled() => {
            state.move_to_leader_state(local_member, term)
        }
        _ => state.move_to_follower_state(true, None),
    }
}
