//! Block canvas model and interaction engine for dashboards.
//!
//! This crate is host-neutral: it has no I/O and no rendering. It owns the
//! blocks of the open dashboard, single selection, view-only gating, and the
//! per-block drag/resize state machines. The host (the server's editor
//! session) feeds it pointer and key events and persists the resulting
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Canvas engine: selection, routing, optimistic updates |
//! | [`controller`] | Per-block drag/resize state machine |
//! | [`block`] | Block record, content kinds, and sparse updates |
//! | [`store`] | In-memory block store with stacking order |
//! | [`input`] | Corners, keys, UI state, and gesture state |
//! | [`hit`] | Hit-testing against block bodies and resize handles |
//! | [`geom`] | Points, rectangles, and clamping |
//! | [`consts`] | Size limits and defaults |

pub mod block;
pub mod consts;
pub mod controller;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod input;
pub mod store;
