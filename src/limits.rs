//! Protocol identity and per-field maxima.
//!
//! Every bounded collection on the wire is checked against its constant
//! here *before* any allocation is sized by the client-supplied value.

/// The remote program number carried in every envelope.
pub const REMOTE_PROGRAM: u32 = 0x2000_8086;

/// The protocol version carried in every envelope.
pub const REMOTE_PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a whole framed message, length prefix included.
///
/// This is also the session buffer capacity: a reply that does not fit is
/// reported as `PayloadTooLarge` rather than grown past the cap.
pub const REMOTE_MESSAGE_MAX: usize = 262_144;

/// Upper bound on any single string field.
pub const REMOTE_STRING_MAX: u32 = 65_536;

/// Bound for the id list returned by `LIST_DOMAINS`.
pub const REMOTE_DOMAIN_ID_LIST_MAX: u32 = 16_384;

/// Bound for the name lists returned by `LIST_DEFINED_DOMAINS`.
pub const REMOTE_DOMAIN_NAME_LIST_MAX: u32 = 1_024;

/// Bound for the name lists returned by `LIST_NETWORKS` and
/// `LIST_DEFINED_NETWORKS`.
pub const REMOTE_NETWORK_NAME_LIST_MAX: u32 = 256;

/// Bound for a single vCPU pinning map.
pub const REMOTE_CPUMAP_MAX: u32 = 256;

/// Bound for the vCPU info array returned by `DOMAIN_GET_VCPUS`.
pub const REMOTE_VCPUINFO_MAX: u32 = 2_048;

/// Bound for the flattened `maxinfo * maplen` cpumap block in
/// `DOMAIN_GET_VCPUS`.
pub const REMOTE_CPUMAPS_MAX: u32 = 16_384;

/// Bound for a scheduler parameter vector.
pub const REMOTE_DOMAIN_SCHEDULER_PARAMETERS_MAX: u32 = 16;

/// Bound for a SASL exchange payload, either direction.
pub const REMOTE_AUTH_SASL_DATA_MAX: u32 = 65_536;

/// Bound for the mechanism list returned by `AUTH_LIST`.
pub const REMOTE_AUTH_TYPE_LIST_MAX: u32 = 20;

/// Bound for an opaque migration cookie.
pub const REMOTE_MIGRATE_COOKIE_MAX: u32 = 16_384;

/// Length of a raw UUID on the wire.
pub const UUID_LEN: usize = 16;

/// Maximum length of a scheduler parameter field name.
pub const SCHED_FIELD_LENGTH: usize = 80;
