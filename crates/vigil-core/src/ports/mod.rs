//! Ports - interfaces to external systems.
//!
//! The only external system this crate talks to is the remote query
//! service, reached through [`StatusSource`]. The trait is the seam for
//! swapping implementations (real client, in-memory fake).

pub mod status_source;

pub use self::status_source::StatusSource;
