//! Survey Gateway - single-endpoint survey intake
//!
//! Accepts survey submissions from the browser, optionally checks the
//! attached reCAPTCHA token, and stores the answers as one object per
//! submission.
//!
//! # Request flow
//!
//! ```text
//!   OPTIONS /  ──────────────────────────────► 204 + preflight CORS headers
//!
//!   POST /
//!     │ read ≤ 32 KiB (excess dropped)          ── unreadable ─► 400
//!     ▼
//!   decode {captcha_token, id, answers}          ── malformed ──► 400
//!     │
//!     ▼
//!   verify token (unless disabled / bypassed)    ── call error ─► 500
//!     │                                          ── not human ──► 400
//!     ▼
//!   write answers to <bucket>/YYYY/MM/DD/HH/MM/<id>  ── fails ──► 500
//!     │
//!     ▼
//!   200 {"status":"ok","message":"thank you"}
//! ```
//!
//! The storage handle, verifier and configuration are built once in
//! [`GatewayState`] and shared read-only by all requests.

pub mod config;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod handler;

pub use config::{GatewayConfig, RecaptchaSettings, StorageBackend, StorageSettings};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayState};
pub use handler::SubmissionError;

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default CORS origin
pub const DEFAULT_ORIGIN: &str = "https://screencovid.com";
