use crate::hub::member::Member;
use dashmap::DashMap;
use proctor_core::{
    Membership, NegotiationMessage, Participant, ParticipantId, Recipient, Role, RoomId,
    SignalEnvelope, SignalingOutput, Subscription, now_millis,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type Roster = HashMap<ParticipantId, Member>;

struct HubInner {
    rooms: DashMap<RoomId, Roster>,
    next_epoch: AtomicU64,
}

/// Per-room publish/subscribe relay for negotiation envelopes.
///
/// The hub only looks at `from`, `to` and `room`; message contents are opaque.
/// Delivery is best effort: envelopes for absent participants are dropped.
#[derive(Clone)]
pub struct SignalingHub {
    inner: Arc<HubInner>,
}

/// Members whose inbox refused a delivery, evicted once the room guard is released.
type Evictions = Vec<(ParticipantId, u64)>;

impl SignalingHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: DashMap::new(),
                next_epoch: AtomicU64::new(1),
            }),
        }
    }

    /// Register `participant` in `room` and announce it to everyone else.
    ///
    /// The returned subscription starts with one `Join` per member already
    /// present. A live registration under the same id is replaced: the room
    /// sees its `Leave` before the new `Join`.
    pub fn join(&self, room: RoomId, participant: ParticipantId, role: Role) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let epoch = self.inner.next_epoch.fetch_add(1, Ordering::Relaxed);
        let mut evictions = Evictions::new();

        {
            let mut roster = self.inner.rooms.entry(room.clone()).or_default();

            if roster.remove(&participant).is_some() {
                info!(%room, %participant, "Replacing live membership");
                let leave = SignalEnvelope::new(
                    room.clone(),
                    participant.clone(),
                    Recipient::All,
                    NegotiationMessage::Leave,
                );
                broadcast(&roster, &participant, &leave, &mut evictions);
            }

            for (id, member) in roster.iter() {
                let replay = SignalEnvelope::new(
                    room.clone(),
                    id.clone(),
                    participant.clone(),
                    NegotiationMessage::Join { role: member.role },
                );
                // Unbounded and freshly created, cannot fail.
                let _ = tx.send(replay);
            }

            let join = SignalEnvelope::new(
                room.clone(),
                participant.clone(),
                Recipient::All,
                NegotiationMessage::Join { role },
            );
            broadcast(&roster, &participant, &join, &mut evictions);

            roster.insert(
                participant.clone(),
                Member {
                    role,
                    joined_at: now_millis(),
                    epoch,
                    inbox: tx,
                },
            );

            info!(%room, %participant, %role, members = roster.len(), "Participant joined");
        }

        self.evict(&room, evictions);

        let membership = Membership {
            room,
            participant,
            role,
            epoch,
        };
        Subscription::new(membership, rx, Arc::new(self.clone()))
    }

    /// Route `envelope` inside `room`. Returns the number of inboxes reached.
    pub fn publish(&self, room: &RoomId, envelope: SignalEnvelope) -> usize {
        self.route(room, envelope, None)
    }

    /// Unsubscribe `participant` and broadcast its `Leave`. Returns `false`
    /// when it was not a member.
    pub fn leave(&self, room: &RoomId, participant: &ParticipantId) -> bool {
        self.remove(room, participant, None)
    }

    pub fn rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<_> = self.inner.rooms.iter().map(|r| r.key().clone()).collect();
        rooms.sort();
        rooms
    }

    /// Current members ordered by join time.
    pub fn members(&self, room: &RoomId) -> Vec<Participant> {
        let Some(roster) = self.inner.rooms.get(room) else {
            return Vec::new();
        };
        let mut members: Vec<_> = roster.iter().map(|(id, m)| m.describe(id)).collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        members
    }

    pub fn is_member(&self, room: &RoomId, participant: &ParticipantId) -> bool {
        self.inner
            .rooms
            .get(room)
            .is_some_and(|roster| roster.contains_key(participant))
    }

    pub fn member_count(&self) -> usize {
        self.inner.rooms.iter().map(|r| r.value().len()).sum()
    }

    fn route(&self, room: &RoomId, envelope: SignalEnvelope, epoch: Option<u64>) -> usize {
        if &envelope.room != room {
            debug!(%room, envelope_room = %envelope.room, "Dropping envelope for another room");
            return 0;
        }

        let mut evictions = Evictions::new();
        let delivered = {
            let Some(roster) = self.inner.rooms.get(room) else {
                debug!(%room, from = %envelope.from, "Dropping envelope for unknown room");
                return 0;
            };

            let Some(sender) = roster.get(&envelope.from) else {
                debug!(%room, from = %envelope.from, "Dropping envelope from non-member");
                return 0;
            };
            if epoch.is_some_and(|e| e != sender.epoch) {
                debug!(%room, from = %envelope.from, "Dropping envelope from replaced membership");
                return 0;
            }

            match &envelope.to {
                Recipient::All => broadcast(&roster, &envelope.from, &envelope, &mut evictions),
                Recipient::Participant(target) => match roster.get(target) {
                    Some(member) => {
                        if member.deliver(envelope.clone()) {
                            1
                        } else {
                            evictions.push((target.clone(), member.epoch));
                            0
                        }
                    }
                    None => {
                        debug!(
                            %room,
                            from = %envelope.from,
                            to = %target,
                            kind = envelope.message.kind(),
                            "Dropping envelope for absent participant"
                        );
                        0
                    }
                },
            }
        };

        self.evict(room, evictions);
        delivered
    }

    fn remove(&self, room: &RoomId, participant: &ParticipantId, epoch: Option<u64>) -> bool {
        let mut pending = vec![(participant.clone(), epoch)];
        let mut removed_requested = false;

        while let Some((id, epoch)) = pending.pop() {
            let mut evictions = Evictions::new();
            let (removed, now_empty) = {
                let Some(mut roster) = self.inner.rooms.get_mut(room) else {
                    continue;
                };

                let matches = roster
                    .get(&id)
                    .is_some_and(|m| epoch.is_none_or(|e| e == m.epoch));
                if matches {
                    roster.remove(&id);
                    let leave = SignalEnvelope::new(
                        room.clone(),
                        id.clone(),
                        Recipient::All,
                        NegotiationMessage::Leave,
                    );
                    broadcast(&roster, &id, &leave, &mut evictions);
                    info!(%room, participant = %id, members = roster.len(), "Participant left");
                }
                (matches, roster.is_empty())
            };

            if removed && &id == participant {
                removed_requested = true;
            }

            if now_empty && self.inner.rooms.remove_if(room, |_, r| r.is_empty()).is_some() {
                info!(%room, "Room closed");
            }

            pending.extend(evictions.into_iter().map(|(id, epoch)| (id, Some(epoch))));
        }

        removed_requested
    }

    fn evict(&self, room: &RoomId, evictions: Evictions) {
        for (id, epoch) in evictions {
            warn!(%room, participant = %id, "Inbox closed, treating as disconnect");
            self.remove(room, &id, Some(epoch));
        }
    }
}

impl Default for SignalingHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingOutput for SignalingHub {
    fn publish_from(&self, membership: &Membership, envelope: SignalEnvelope) -> usize {
        self.route(&membership.room, envelope, Some(membership.epoch))
    }

    fn release(&self, membership: &Membership) {
        self.remove(&membership.room, &membership.participant, Some(membership.epoch));
    }
}

/// Send `envelope` to everyone in `roster` except `sender`.
fn broadcast(
    roster: &Roster,
    sender: &ParticipantId,
    envelope: &SignalEnvelope,
    evictions: &mut Evictions,
) -> usize {
    let mut delivered = 0;
    for (id, member) in roster.iter().filter(|(id, _)| *id != sender) {
        if member.deliver(envelope.clone()) {
            delivered += 1;
        } else {
            evictions.push((id.clone(), member.epoch));
        }
    }
    delivered
}
