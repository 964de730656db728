//! The event catalog: numeric event-type ids and their stable names.
//!
//! The backend tags every notification with a numeric id from a fixed
//! catalog. [`EventKind::from_id`] turns that id into a typed value and
//! [`resolve_name`] into the stable string name that subscribers use.
//! Both are total: an id outside the catalog becomes
//! [`EventKind::Unknown`] (`"UNKNOWN"`), so a newer backend emitting a new
//! kind of event never breaks dispatch of the events that follow it.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::EventPayload;

/// Declares `EventKind` together with its id and name tables, keeping the
/// three in one place so they cannot drift apart.
macro_rules! event_kinds {
    ($($variant:ident = $id:literal => $name:literal,)+) => {
        /// A semantic event type, resolved from the wire's numeric id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $($variant,)+
            /// Any id the catalog does not know.
            Unknown,
        }

        impl EventKind {
            /// Every known kind, in catalog order. Excludes `Unknown`.
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)+];

            /// Resolves a numeric event-type id. Never fails.
            pub fn from_id(id: i64) -> Self {
                match id {
                    $($id => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }

            /// The catalog id, or `None` for `Unknown`.
            pub fn id(self) -> Option<i64> {
                match self {
                    $(Self::$variant => Some($id),)+
                    Self::Unknown => None,
                }
            }

            /// The stable name subscribers match on.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Unknown => "UNKNOWN",
                }
            }
        }

        impl FromStr for EventKind {
            type Err = UnknownEventName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    "UNKNOWN" => Ok(Self::Unknown),
                    _ => Err(UnknownEventName(s.to_string())),
                }
            }
        }
    };
}

event_kinds! {
    Info = 100 => "INFO",
    SmtpConnected = 101 => "SMTP_CONNECTED",
    ImapConnected = 102 => "IMAP_CONNECTED",
    SmtpMessageSent = 103 => "SMTP_MESSAGE_SENT",
    ImapMessageDeleted = 104 => "IMAP_MESSAGE_DELETED",
    ImapMessageMoved = 105 => "IMAP_MESSAGE_MOVED",
    NewBlobFile = 150 => "NEW_BLOB_FILE",
    DeletedBlobFile = 151 => "DELETED_BLOB_FILE",
    Warning = 300 => "WARNING",
    Error = 400 => "ERROR",
    ErrorSelfNotInGroup = 410 => "ERROR_SELF_NOT_IN_GROUP",
    MsgsChanged = 2000 => "MSGS_CHANGED",
    IncomingMsg = 2005 => "INCOMING_MSG",
    MsgsNoticed = 2008 => "MSGS_NOTICED",
    MsgDelivered = 2010 => "MSG_DELIVERED",
    MsgFailed = 2012 => "MSG_FAILED",
    MsgRead = 2015 => "MSG_READ",
    ChatModified = 2020 => "CHAT_MODIFIED",
    ChatEphemeralTimerModified = 2021 => "CHAT_EPHEMERAL_TIMER_MODIFIED",
    ContactsChanged = 2030 => "CONTACTS_CHANGED",
    LocationChanged = 2035 => "LOCATION_CHANGED",
    ConfigureProgress = 2041 => "CONFIGURE_PROGRESS",
    ImexProgress = 2051 => "IMEX_PROGRESS",
    ImexFileWritten = 2052 => "IMEX_FILE_WRITTEN",
    SecurejoinInviterProgress = 2060 => "SECUREJOIN_INVITER_PROGRESS",
    SecurejoinJoinerProgress = 2061 => "SECUREJOIN_JOINER_PROGRESS",
    ConnectivityChanged = 2100 => "CONNECTIVITY_CHANGED",
    SelfavatarChanged = 2110 => "SELFAVATAR_CHANGED",
    WebxdcStatusUpdate = 2120 => "WEBXDC_STATUS_UPDATE",
}

/// Maps a numeric event-type id to its stable name.
///
/// ```rust
/// assert_eq!(deltarpc_protocol::resolve_name(2005), "INCOMING_MSG");
/// assert_eq!(deltarpc_protocol::resolve_name(-7), "UNKNOWN");
/// ```
pub fn resolve_name(id: i64) -> &'static str {
    EventKind::from_id(id).as_str()
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event name: {0}")]
pub struct UnknownEventName(pub String);

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A notification after name resolution; what listeners receive.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// The raw event-type id from the wire. Kept so that `Unknown`
    /// events can still be told apart.
    pub type_id: i64,
    pub context_id: u32,
    pub field1: Value,
    pub field2: Value,
}

impl Event {
    /// The resolved name, e.g. `"INCOMING_MSG"`.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl From<EventPayload> for Event {
    fn from(payload: EventPayload) -> Self {
        Self {
            kind: EventKind::from_id(payload.id),
            type_id: payload.id,
            context_id: payload.context_id,
            field1: payload.field1,
            field2: payload.field2,
        }
    }
}
