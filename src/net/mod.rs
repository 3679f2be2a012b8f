//! Listening socket with explicit address-family selection.

pub(crate) mod socket;

pub use socket::{AcceptedConnection, AddressFamily, ListeningSocket, PeerInfo, UNKNOWN_HOST};
