//! Survey Core - data model and outbound I/O for survey submissions
//!
//! This crate holds everything the gateway needs besides HTTP serving:
//!
//! 1. **Data model** (`types`): the incoming [`Submission`], the reCAPTCHA
//!    [`VerificationResult`] and the [`ResponseEnvelope`] returned to callers.
//! 2. **Bot verification** (`verification`): a [`Verifier`] trait and the
//!    [`RecaptchaClient`] that talks to Google's `siteverify` endpoint.
//! 3. **Object storage** (`storage`): the [`ObjectStore`] trait, the Cloud
//!    Storage, filesystem and in-memory backends, time-based key derivation
//!    and the timeout-bounded [`ObjectWriter`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use survey_core::storage::{object_key, MemoryObjectStore, ObjectWriter};
//!
//! # async fn example() -> survey_core::Result<()> {
//! let store = Arc::new(MemoryObjectStore::new("answers"));
//! let writer = ObjectWriter::new(store.clone());
//! let key = object_key(chrono::Utc::now(), "respondent-42");
//! writer.write(&key, br#"{"q1":"yes"}"#).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod storage;
pub mod types;
pub mod verification;

pub use error::{CoreError, Result, StorageError, VerificationError};
pub use storage::{ObjectStore, ObjectWriter};
pub use types::{ResponseEnvelope, ResponseStatus, Submission, VerificationResult};
pub use verification::{RecaptchaClient, Verifier};

/// Maximum number of request body bytes read before decoding
pub const BODY_LIMIT: usize = 32_768;
