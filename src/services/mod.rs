//! Session services used by the request gate.
//!
//! ARCHITECTURE
//! ============
//! `session` defines the provider seam and the fail-closed lookup; concrete
//! providers live beside it so the gate never depends on one.

pub mod session;
pub mod supabase;
