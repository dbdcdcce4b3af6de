//! JSON-RPC 2.0 communication layer between the viewer and its host page.
//!
//! On wasm the viewer runs inside an iframe and talks to the parent window via
//! `postMessage`. Native builds exchange the same messages through the
//! in-process [`web_rpc::RpcChannel`].
//!
//! ## Message Flow
//!
//! ```text
//! Host (Parent Window)  <──postMessage──>  Viewer (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        ├─ Notification (no ID) ───────────────> ├─ Process, no reply
//!        │                                        │
//!        │ <────────── Notification (no ID) ──────┤
//! ```
//!
//! Point updates are usually sent as notifications, since the producer does
//! not wait for an answer.
//!
//! ## Methods
//!
//! - `update_points {points: number[]}`: flat xyz triples; an empty array means
//!   no update. Lengths that are not a multiple of 3 fail with `-32602`.
//! - `set_active {active: boolean}`: display-only activity flag.
//! - `mount` / `unmount`: lifecycle commands.
//! - `get_status`: state, activity, draw count, capacity, frames rendered, fps.
//! - `get_fps`: smoothed frame rate.
//!
//! ## Notifications
//!
//! - `viewer_status`: on lifecycle state or activity change.
//! - `viewer_warning`: rejected updates, surface problems, bad settings.
//! - `fps_update`: every 0.5 s while running.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32700`: Parse error
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// JSON-RPC 2.0 bidirectional communication system for host integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
