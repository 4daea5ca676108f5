//! Event types exchanged across systems.
//!
//! Submodules:
//! - [`agentevent`] – canonical coding-agent activity events and their
//!   mapping to animation states
pub mod agentevent;
