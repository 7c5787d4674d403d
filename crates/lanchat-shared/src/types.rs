use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

/// Declares a fieldless enum that travels over the bridge as a small integer.
///
/// The backend encodes every state/kind column as `i8`; this keeps the
/// conversion in one place and rejects unknown discriminants instead of
/// silently mapping them.
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i8", into = "i8")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub fn as_i8(self) -> i8 {
                match self {
                    $( Self::$variant => $value, )+
                }
            }
        }

        impl TryFrom<i8> for $name {
            type Error = UnknownVariant;

            fn try_from(value: i8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Self::$variant), )+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other,
                    }),
                }
            }
        }

        impl From<$name> for i8 {
            fn from(value: $name) -> i8 {
                value.as_i8()
            }
        }
    };
}

// User identity = backend-assigned uid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

int_enum! {
    /// Whether a conversation is one-to-one or a group chat.
    pub enum SessionKind {
        Direct = 0,
        Group = 1,
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// Addresses a conversation from the local user's point of view.
///
/// A peer uid and a group id may share the same number, so the kind is part
/// of the key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub kind: SessionKind,
    pub target: i64,
}

impl SessionKey {
    pub fn new(kind: SessionKind, target: i64) -> Self {
        Self { kind, target }
    }

    pub fn direct(peer: UserId) -> Self {
        Self::new(SessionKind::Direct, peer.0)
    }

    pub fn group(group: GroupId) -> Self {
        Self::new(SessionKind::Group, group.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.target)
    }
}

int_enum! {
    pub enum MessageType {
        Text = 0,
        File = 1,
        Emoji = 2,
        Image = 3,
        Voice = 4,
        Video = 5,
    }
}

int_enum! {
    /// Delivery state of a chat message.
    pub enum MessageStatus {
        Sending = 0,
        Sent = 1,
        Read = 2,
        Failed = -1,
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Read => "read",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

int_enum! {
    pub enum TransferStatus {
        Pending = 0,
        Transferring = 1,
        Completed = 2,
        Failed = -1,
        Cancelled = -2,
    }
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Cancelled | TransferStatus::Failed
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Transferring => "transferring",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

int_enum! {
    pub enum TransferDirection {
        Download = 0,
        Upload = 1,
    }
}

int_enum! {
    pub enum OnlineStatus {
        Offline = 0,
        Online = 1,
        Busy = 2,
        Away = 3,
        Invisible = 4,
    }
}

int_enum! {
    pub enum GroupRole {
        Member = 0,
        Admin = 1,
        Owner = 2,
    }
}
