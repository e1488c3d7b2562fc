//! Node Challenge Manager
//!
//! # Security (Eclipse Attack Defense - Eviction-on-Failure)
//!
//! When a verified newcomer finds its bucket full, the oldest occupant is not
//! evicted outright. It is challenged with a PING first:
//! - the incumbent answers before its request expires: challenge fails,
//!   incumbent stays, the newcomer is rejected;
//! - the incumbent's PING expires: challenge succeeds, incumbent is evicted.
//!
//! This keeps an attacker from flushing stable peers by connecting a stream
//! of fresh identities.
//!
//! The manager never talks to the network. Starting a challenge yields a
//! [`ChallengeCommand`] that the explorer executes; the challenge is then
//! registered under the message id of the PING actually sent.

use std::collections::HashMap;

use super::entities::{Node, Timestamp};
use super::messages::MessageId;

/// A liveness challenge against a bucket incumbent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChallenge {
    challenge_id: MessageId,
    incumbent: Node,
    challenger: Node,
    started_at: Timestamp,
}

impl NodeChallenge {
    /// Id of the PING sent to the incumbent.
    pub fn challenge_id(&self) -> MessageId {
        self.challenge_id
    }

    pub fn incumbent(&self) -> &Node {
        &self.incumbent
    }

    pub fn challenger(&self) -> &Node {
        &self.challenger
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
}

/// Side effect requested by the challenge protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeCommand {
    /// Send a PING to `incumbent`, then [`NodeChallengeManager::register`]
    /// the challenge under that PING's message id.
    PingIncumbent {
        incumbent: Node,
        challenger: Node,
        started_at: Timestamp,
    },
}

/// Active challenges keyed by the id of the incumbent's PING.
#[derive(Debug, Default)]
pub struct NodeChallengeManager {
    challenges: HashMap<MessageId, NodeChallenge>,
}

impl NodeChallengeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a challenge of `incumbent` on behalf of `challenger`.
    ///
    /// Returns `None` while the incumbent is already under challenge; the
    /// first challenger keeps the slot claim.
    pub fn start_challenge(
        &self,
        incumbent: Node,
        challenger: Node,
        now: Timestamp,
    ) -> Option<ChallengeCommand> {
        if self.is_challenged(&incumbent) {
            return None;
        }
        Some(ChallengeCommand::PingIncumbent {
            incumbent,
            challenger,
            started_at: now,
        })
    }

    /// Record a challenge once its PING has been sent.
    pub fn register(
        &mut self,
        challenge_id: MessageId,
        incumbent: Node,
        challenger: Node,
        started_at: Timestamp,
    ) {
        self.challenges.insert(
            challenge_id,
            NodeChallenge {
                challenge_id,
                incumbent,
                challenger,
                started_at,
            },
        );
    }

    /// Resolve a challenge, either by a PONG or by expiry of its PING.
    pub fn remove_challenge(&mut self, challenge_id: &MessageId) -> Option<NodeChallenge> {
        self.challenges.remove(challenge_id)
    }

    pub fn get(&self, challenge_id: &MessageId) -> Option<&NodeChallenge> {
        self.challenges.get(challenge_id)
    }

    pub fn is_challenged(&self, node: &Node) -> bool {
        self.challenges
            .values()
            .any(|challenge| challenge.incumbent.id() == node.id())
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
