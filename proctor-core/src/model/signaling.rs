use crate::model::link::LinkId;
use crate::model::participant::{ParticipantId, Role};
use crate::model::room::RoomId;
use crate::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    /// Public STUN servers used when nothing else is configured.
    pub fn default_servers() -> Vec<Self> {
        vec![Self {
            urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
            username: None,
            credential: None,
        }]
    }
}

/// Network path descriptor in the browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Addressee of an envelope. Serialized as the participant id, or `"all"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recipient {
    All,
    Participant(ParticipantId),
}

const ALL_RECIPIENTS: &str = "all";

impl From<String> for Recipient {
    fn from(s: String) -> Self {
        if s == ALL_RECIPIENTS {
            Recipient::All
        } else {
            Recipient::Participant(ParticipantId(s))
        }
    }
}

impl From<Recipient> for String {
    fn from(r: Recipient) -> Self {
        match r {
            Recipient::All => ALL_RECIPIENTS.to_owned(),
            Recipient::Participant(id) => id.0,
        }
    }
}

impl From<ParticipantId> for Recipient {
    fn from(id: ParticipantId) -> Self {
        Recipient::Participant(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NegotiationMessage {
    Join {
        role: Role,
    },
    Leave,
    Offer {
        link: LinkId,
        /// Participant whose capture flows on this link.
        source: ParticipantId,
        sdp: String,
    },
    Answer {
        link: LinkId,
        sdp: String,
    },
    IceCandidate {
        link: LinkId,
        candidate: IceCandidate,
    },
}

impl NegotiationMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            NegotiationMessage::Join { .. } => "join",
            NegotiationMessage::Leave => "leave",
            NegotiationMessage::Offer { .. } => "offer",
            NegotiationMessage::Answer { .. } => "answer",
            NegotiationMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEnvelope {
    pub from: ParticipantId,
    pub to: Recipient,
    pub room: RoomId,
    pub message: NegotiationMessage,
    pub sent_at: u64,
}

impl SignalEnvelope {
    pub fn new(
        room: RoomId,
        from: ParticipantId,
        to: impl Into<Recipient>,
        message: NegotiationMessage,
    ) -> Self {
        Self {
            from,
            to: to.into(),
            room,
            message,
            sent_at: now_millis(),
        }
    }

    pub fn is_addressed_to(&self, participant: &ParticipantId) -> bool {
        match &self.to {
            Recipient::All => &self.from != participant,
            Recipient::Participant(id) => id == participant,
        }
    }
}

/// Milliseconds since the Unix epoch, as stamped on envelopes.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
