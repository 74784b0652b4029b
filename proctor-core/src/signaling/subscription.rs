use crate::model::{NegotiationMessage, ParticipantId, Recipient, Role, RoomId, SignalEnvelope};
use crate::signaling::signaling_output::{Membership, SignalingOutput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Cloneable sending half of a subscription.
#[derive(Clone)]
pub struct Publisher {
    membership: Arc<Membership>,
    output: Arc<dyn SignalingOutput>,
    left: Arc<AtomicBool>,
}

impl Publisher {
    pub fn participant(&self) -> &ParticipantId {
        &self.membership.participant
    }

    pub fn room(&self) -> &RoomId {
        &self.membership.room
    }

    /// Stamp `message` with this member's identity and hand it to the relay.
    pub fn send(&self, to: impl Into<Recipient>, message: NegotiationMessage) -> usize {
        if self.left.load(Ordering::Acquire) {
            debug!(
                participant = %self.membership.participant,
                kind = message.kind(),
                "Dropping outbound signal after leave"
            );
            return 0;
        }

        let envelope = SignalEnvelope::new(
            self.membership.room.clone(),
            self.membership.participant.clone(),
            to,
            message,
        );
        self.output.publish_from(&self.membership, envelope)
    }
}

/// Explicit signaling context of one participant in one room.
///
/// Created by joining a relay; leaving happens on [`Subscription::leave`] or
/// on drop, whichever comes first.
pub struct Subscription {
    publisher: Publisher,
    inbox: mpsc::UnboundedReceiver<SignalEnvelope>,
}

impl Subscription {
    pub fn new(
        membership: Membership,
        inbox: mpsc::UnboundedReceiver<SignalEnvelope>,
        output: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            publisher: Publisher {
                membership: Arc::new(membership),
                output,
                left: Arc::new(AtomicBool::new(false)),
            },
            inbox,
        }
    }

    pub fn membership(&self) -> &Membership {
        &self.publisher.membership
    }

    pub fn room(&self) -> &RoomId {
        &self.publisher.membership.room
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.publisher.membership.participant
    }

    pub fn role(&self) -> Role {
        self.publisher.membership.role
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    pub fn send(&self, to: impl Into<Recipient>, message: NegotiationMessage) -> usize {
        self.publisher.send(to, message)
    }

    /// Next envelope for this participant. `None` once the subscription has
    /// left or the relay dropped the membership.
    pub async fn recv(&mut self) -> Option<SignalEnvelope> {
        if self.has_left() {
            return None;
        }
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SignalEnvelope> {
        if self.has_left() {
            return None;
        }
        self.inbox.try_recv().ok()
    }

    pub fn has_left(&self) -> bool {
        self.publisher.left.load(Ordering::Acquire)
    }

    /// Unsubscribe from the room. Safe to call more than once.
    pub fn leave(&mut self) {
        if self.publisher.left.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inbox.close();
        self.publisher.output.release(&self.publisher.membership);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.leave();
    }
}
