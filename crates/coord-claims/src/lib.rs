//! Claims -- the agent registry and the claim lease lifecycle.
//!
//! An agent's right to work an issue is an exclusive, TTL-bounded lease
//! enforced by the `claims.issue_id` primary key at the store. This crate
//! owns the races around that key: who wins a contested claim, how an
//! expired lease reverts the issue to `open`, and how a gone-dark agent's
//! claims get swept.

pub mod error;

use std::sync::Arc;

use tracing::{debug, info, warn};

use coord_core::{Agent, AgentStatus, Broadcast, BroadcastEventType, Claim, Issue, IssueStatus, IssueUpdate, Metadata, now_unix};
use coord_storage::Storage;

pub use error::{ClaimsError, Result};

pub struct Claims {
    storage: Arc<dyn Storage>,
    default_ttl_secs: i64,
    dead_agent_timeout_secs: i64,
}

impl Claims {
    pub fn new(storage: Arc<dyn Storage>, config: &coord_config::CoordinatorConfig) -> Self {
        Self {
            storage,
            default_ttl_secs: config.claim_ttl_secs,
            dead_agent_timeout_secs: config.dead_agent_timeout_secs,
        }
    }

    /// Upserts the agent with `status=active`. Idempotent; re-registering
    /// overwrites capabilities and metadata.
    pub fn register_agent(&self, agent_id: &str, capabilities: impl IntoIterator<Item = String>, metadata: Metadata) -> Result<Agent> {
        let agent = Agent {
            agent_id: agent_id.to_string(),
            capabilities: capabilities.into_iter().collect(),
            status: AgentStatus::Active,
            last_seen_at: now_unix(),
            metadata,
        };
        self.storage.upsert_agent(&agent)?;
        debug!(agent_id, "agent registered");
        Ok(agent)
    }

    /// Refreshes `last_seen_at`/`status` and bumps `heartbeat_at` on every
    /// claim the agent holds. A no-op, not an error, if the agent is unknown.
    pub fn heartbeat(&self, agent_id: &str) -> Result<()> {
        let now = now_unix();
        match self.storage.get_agent(agent_id) {
            Ok(_) => {
                self.storage.touch_agent_heartbeat(agent_id, now)?;
            }
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        for claim in self.storage.get_agent_claims(agent_id)? {
            self.storage.refresh_claim_heartbeat(&claim.issue_id, now)?;
        }
        Ok(())
    }

    /// Attempts to acquire (or idempotently refresh) a lease on `issue_id`.
    ///
    /// Runs [`Self::reclaim_expired`] first, then follows the
    /// already-held / held-by-other / fresh-insert decision tree. Returns
    /// `false` both for "held by someone else" and for a lost PK race on
    /// insert -- the caller cannot and should not distinguish the two.
    pub fn claim(&self, issue_id: &str, agent_id: &str, ttl_secs: Option<i64>) -> Result<bool> {
        self.reclaim_expired()?;

        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let now = now_unix();
        let expires_at = if ttl > 0 { Some(now + ttl) } else { None };

        if let Some(existing) = self.storage.get_claim(issue_id)? {
            if existing.agent_id != agent_id {
                return Ok(false);
            }
            self.storage.refresh_claim_heartbeat(issue_id, now)?;
            return Ok(true);
        }

        let claim = Claim {
            issue_id: issue_id.to_string(),
            agent_id: agent_id.to_string(),
            claimed_at: now,
            expires_at,
            heartbeat_at: now,
        };
        let inserted = self.storage.try_insert_claim(&claim)?;
        if !inserted {
            return Ok(false);
        }

        self.storage.update_issue(
            issue_id,
            &IssueUpdate {
                status: Some(IssueStatus::InProgress),
                ..Default::default()
            },
        )?;
        self.broadcast(BroadcastEventType::Claimed, issue_id, agent_id, Metadata::new());
        info!(issue_id, agent_id, "claim acquired");
        Ok(true)
    }

    /// Deletes the claim if held by `agent_id` and unconditionally reopens
    /// the issue. A silent no-op if the caller doesn't hold it.
    pub fn release(&self, issue_id: &str, agent_id: &str) -> Result<()> {
        let removed = self.storage.delete_claim_if_held(issue_id, agent_id)?;
        if removed {
            self.storage.update_issue(
                issue_id,
                &IssueUpdate {
                    status: Some(IssueStatus::Open),
                    ..Default::default()
                },
            )?;
            self.broadcast(BroadcastEventType::Released, issue_id, agent_id, Metadata::new());
        }
        Ok(())
    }

    /// Sweeps claims whose `expires_at` has passed: reopens the issue,
    /// marks the owning agent `dead`, and emits a `released` broadcast
    /// tagged `{reason: "expired"}`. Returns the reclaimed issues.
    pub fn reclaim_expired(&self) -> Result<Vec<Issue>> {
        let now = now_unix();
        let expired = self.storage.list_expired_claims(now)?;
        let mut reclaimed = Vec::new();

        for claim in expired {
            let removed = self.storage.delete_claim(&claim.issue_id)?;
            if !removed {
                continue;
            }
            self.storage.update_issue(
                &claim.issue_id,
                &IssueUpdate {
                    status: Some(IssueStatus::Open),
                    ..Default::default()
                },
            )?;
            self.storage.mark_agent_status(&claim.agent_id, AgentStatus::Dead)?;

            let mut payload = Metadata::new();
            payload.0.insert("reason".to_string(), serde_json::Value::String("expired".to_string()));
            self.broadcast(BroadcastEventType::Released, &claim.issue_id, &claim.agent_id, payload);

            warn!(issue_id = %claim.issue_id, agent_id = %claim.agent_id, "claim expired, reclaimed");
            reclaimed.push(self.storage.get_issue(&claim.issue_id)?);
        }
        Ok(reclaimed)
    }

    /// Marks agents silent for longer than `timeout_secs` (default the
    /// configured dead-agent timeout) `dead` and releases every claim they
    /// hold.
    pub fn detect_dead_agents(&self, timeout_secs: Option<i64>) -> Result<Vec<Agent>> {
        let timeout = timeout_secs.unwrap_or(self.dead_agent_timeout_secs);
        let now = now_unix();
        let cutoff = now - timeout;

        let mut newly_dead = Vec::new();
        for agent in self.storage.list_agents()? {
            if agent.status == AgentStatus::Active && agent.last_seen_at < cutoff {
                self.storage.mark_agent_status(&agent.agent_id, AgentStatus::Dead)?;
                for claim in self.storage.get_agent_claims(&agent.agent_id)? {
                    self.release(&claim.issue_id, &agent.agent_id)?;
                }
                newly_dead.push(self.storage.get_agent(&agent.agent_id)?);
            }
        }
        Ok(newly_dead)
    }

    pub fn get_claim(&self, issue_id: &str) -> Result<Option<Claim>> {
        Ok(self.storage.get_claim(issue_id)?)
    }

    pub fn get_agent_claims(&self, agent_id: &str) -> Result<Vec<Claim>> {
        Ok(self.storage.get_agent_claims(agent_id)?)
    }

    pub fn get_active_work(&self) -> Result<Vec<Claim>> {
        Ok(self.storage.list_active_claims()?)
    }

    pub fn broadcast(&self, event_type: BroadcastEventType, issue_id: &str, agent_id: &str, payload: Metadata) {
        let broadcast = Broadcast {
            id: 0,
            event_type,
            issue_id: issue_id.to_string(),
            agent_id: agent_id.to_string(),
            payload,
            created_at: now_unix(),
        };
        if let Err(e) = self.storage.append_broadcast(&broadcast) {
            warn!(error = %e, issue_id, "failed to emit broadcast");
        }
    }
}
