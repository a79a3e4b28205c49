//! # argus-types: Core types for Argus
//!
//! This crate contains the shared types used across the Argus engine:
//! - Event identity ([`EventId`])
//! - Temporal types ([`Timestamp`])
//! - Payload compression tags ([`CompressionKind`])
//! - Self-describing event schemas ([`EventType`], [`Field`])
//! - Typed event data ([`Value`])
//! - The event itself ([`Event`])

use std::{
    fmt::{self, Display},
    net::IpAddr,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

// ============================================================================
// Event identity - Copy (cheap 8-byte value)
// ============================================================================

/// Unique identifier of an event within the identifier space.
///
/// Identifiers are allocated externally in half-open ranges and attached to
/// sealed batches; the value `0` is reserved and means "unassigned".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EventId(u64);

impl EventId {
    /// The reserved "invalid / unassigned" identifier.
    pub const INVALID: EventId = EventId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the identifier as a `u64`.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns true unless this is the reserved invalid identifier.
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EventId> for u64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}

// ============================================================================
// Timestamp - Copy (8-byte value)
// ============================================================================

/// Event timestamp, stored as nanoseconds since the Unix epoch
/// (1970-01-01 00:00:00 UTC). This gives ~584 years of range.
///
/// [`Timestamp::MAX`] and [`Timestamp::MIN`] double as the conventional
/// "+infinity" / "-infinity" sentinels that an empty batch carries for its
/// timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch, also the smallest representable timestamp.
    pub const MIN: Timestamp = Timestamp(0);

    /// The largest representable timestamp.
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Creates a timestamp from nanoseconds since the Unix epoch.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the timestamp as nanoseconds since the Unix epoch.
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp as seconds since the Unix epoch (truncating).
    pub fn as_secs(&self) -> u64 {
        self.0 / 1_000_000_000
    }

    /// Creates a timestamp for the current time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is before the Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before Unix epoch");
        Self(duration.as_nanos() as u64)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Compression
// ============================================================================

/// Compression applied to a batch payload.
///
/// `None` (identity) is always available; the other codecs trade CPU for
/// space in the usual ways.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
pub enum CompressionKind {
    /// No compression (passthrough).
    #[default]
    None,
    /// LZ4 frame compression.
    Lz4,
    /// Snappy frame compression.
    Snappy,
    /// Zstandard compression.
    Zstd,
}

impl Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionKind::None => "none",
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Snappy => "snappy",
            CompressionKind::Zstd => "zstd",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Event schemas
// ============================================================================

/// A named field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: EventType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: EventType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A self-describing event schema.
///
/// Types are value-equal and hashable so that a batch writer can intern
/// them: within one batch every distinct type is serialized once and
/// referenced by a dense integer id afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Boolean flag.
    Bool,
    /// Unsigned 64-bit counter.
    Count,
    /// Signed 64-bit integer.
    Int,
    /// IEEE 754 double.
    Real,
    /// Signed duration in nanoseconds.
    Duration,
    /// Nanoseconds since the Unix epoch.
    Timestamp,
    /// UTF-8 text.
    Text,
    /// Regular-expression pattern source.
    Pattern,
    /// IPv4 or IPv6 address.
    Address,
    /// Address prefix.
    Subnet,
    /// Transport-layer port.
    Port,
    /// Enumeration over a closed set of labels.
    Enumeration(Vec<String>),
    /// Homogeneous sequence.
    Vector(Box<EventType>),
    /// Homogeneous set.
    Set(Box<EventType>),
    /// Homogeneous key-value mapping.
    Table {
        key: Box<EventType>,
        value: Box<EventType>,
    },
    /// Record with named fields.
    Record(Vec<Field>),
}

// ============================================================================
// Event data
// ============================================================================

/// Transport protocol qualifier of a [`Value::Port`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PortProtocol {
    #[default]
    Unknown,
    Tcp,
    Udp,
    Icmp,
}

/// A typed event datum.
///
/// The variant inventory mirrors [`EventType`]; containers nest
/// recursively. `Real` compares by bit pattern (NaN == NaN) so that
/// write-then-read equality laws hold for every value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent datum.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit counter.
    Count(u64),
    /// IEEE 754 double.
    Real(f64),
    /// Signed duration in nanoseconds.
    Duration(i64),
    /// Point in time.
    Timestamp(Timestamp),
    /// UTF-8 text.
    Text(String),
    /// Regular-expression pattern source.
    Pattern(String),
    /// IPv4 or IPv6 address.
    Address(IpAddr),
    /// Address prefix.
    Subnet { network: IpAddr, prefix: u8 },
    /// Transport-layer port.
    Port { number: u16, protocol: PortProtocol },
    /// Index into an enumeration's label set.
    Enum(u64),
    /// Homogeneous sequence.
    Vector(Vec<Value>),
    /// Homogeneous set.
    Set(Vec<Value>),
    /// Key-value mapping.
    Table(Vec<(Value, Value)>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Count(a), Value::Count(b)) => a == b,
            // Bit-pattern equality: NaN == NaN, -0.0 != 0.0.
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            (Value::Address(a), Value::Address(b)) => a == b,
            (
                Value::Subnet {
                    network: an,
                    prefix: ap,
                },
                Value::Subnet {
                    network: bn,
                    prefix: bp,
                },
            ) => an == bn && ap == bp,
            (
                Value::Port {
                    number: an,
                    protocol: ap,
                },
                Value::Port {
                    number: bn,
                    protocol: bp,
                },
            ) => an == bn && ap == bp,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Count(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<IpAddr> for Value {
    fn from(value: IpAddr) -> Self {
        Value::Address(value)
    }
}

// ============================================================================
// Events
// ============================================================================

/// A single telemetry event: an identifier, a timestamp and a typed datum.
///
/// Events are constructed unlabeled (`id == EventId::INVALID`); a batch
/// reader assigns identifiers during materialization from the batch's
/// identifier bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    timestamp: Timestamp,
    ty: EventType,
    value: Value,
}

impl Event {
    /// Creates an unlabeled event.
    pub fn new(ty: EventType, value: Value, timestamp: Timestamp) -> Self {
        Self {
            id: EventId::INVALID,
            timestamp,
            ty,
            value,
        }
    }

    /// Returns the assigned identifier ([`EventId::INVALID`] if unlabeled).
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Assigns an identifier.
    pub fn set_id(&mut self, id: EventId) {
        self.id = id;
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn event_type(&self) -> &EventType {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn invalid_event_id_is_reserved() {
        assert!(!EventId::INVALID.is_valid());
        assert!(!EventId::default().is_valid());
        assert!(EventId::new(1).is_valid());
        assert_eq!(EventId::INVALID.as_u64(), 0);
    }

    #[test]
    fn timestamp_sentinels_bracket_everything() {
        let ts = Timestamp::from_nanos(1_234_567_890);
        assert!(Timestamp::MIN < ts);
        assert!(ts < Timestamp::MAX);
        assert_eq!(ts.as_secs(), 1);
    }

    #[test]
    fn compression_kind_displays_lowercase() {
        assert_eq!(CompressionKind::None.to_string(), "none");
        assert_eq!(CompressionKind::Lz4.to_string(), "lz4");
        assert_eq!(CompressionKind::Snappy.to_string(), "snappy");
        assert_eq!(CompressionKind::Zstd.to_string(), "zstd");
    }

    #[test]
    fn event_types_are_value_equal() {
        let conn = EventType::Record(vec![
            Field::new("orig_h", EventType::Address),
            Field::new("duration", EventType::Duration),
        ]);
        let same = EventType::Record(vec![
            Field::new("orig_h", EventType::Address),
            Field::new("duration", EventType::Duration),
        ]);
        let other = EventType::Record(vec![Field::new("orig_h", EventType::Address)]);
        assert_eq!(conn, same);
        assert_ne!(conn, other);

        use std::collections::HashMap;
        let mut dictionary = HashMap::new();
        dictionary.insert(conn, 0u32);
        assert_eq!(dictionary.get(&same), Some(&0));
        assert_eq!(dictionary.get(&other), None);
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(-1i64), Value::Int(-1));
        assert_eq!(Value::from(1u64), Value::Count(1));
        assert_eq!(Value::from("scan"), Value::Text("scan".into()));
        assert_eq!(
            Value::from("scan".to_string()),
            Value::Text("scan".into())
        );
        let addr: IpAddr = "::1".parse().unwrap();
        assert_eq!(Value::from(addr), Value::Address(addr));
    }

    #[test]
    fn real_values_compare_by_bit_pattern() {
        assert_eq!(Value::Real(f64::NAN), Value::Real(f64::NAN));
        assert_ne!(Value::Real(0.0), Value::Real(-0.0));
        assert_eq!(Value::Real(1.5), Value::Real(1.5));
    }

    #[test_case(Value::Null)]
    #[test_case(Value::Bool(true))]
    #[test_case(Value::Int(-42))]
    #[test_case(Value::Count(42))]
    #[test_case(Value::Real(6.02e23))]
    #[test_case(Value::Text("conn".into()))]
    #[test_case(Value::Address("192.168.0.1".parse().unwrap()))]
    #[test_case(Value::Subnet { network: "10.0.0.0".parse().unwrap(), prefix: 8 })]
    #[test_case(Value::Port { number: 443, protocol: PortProtocol::Tcp })]
    #[test_case(Value::Vector(vec![Value::Int(1), Value::Null]))]
    #[test_case(Value::Table(vec![(Value::Text("k".into()), Value::Count(1))]))]
    fn values_roundtrip_through_postcard(value: Value) {
        let bytes = postcard::to_allocvec(&value).unwrap();
        let back: Value = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn event_types_roundtrip_through_postcard() {
        let ty = EventType::Table {
            key: Box::new(EventType::Text),
            value: Box::new(EventType::Vector(Box::new(EventType::Count))),
        };
        let bytes = postcard::to_allocvec(&ty).unwrap();
        let back: EventType = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(ty, back);
    }

    #[test]
    fn events_start_unlabeled() {
        let mut event = Event::new(
            EventType::Count,
            Value::Count(7),
            Timestamp::from_nanos(100),
        );
        assert_eq!(event.id(), EventId::INVALID);
        event.set_id(EventId::new(99));
        assert!(event.id().is_valid());
        assert_eq!(event.value(), &Value::Count(7));
    }
}
