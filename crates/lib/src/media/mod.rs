//! Media handling: classify content types, fetch provider media, store it locally, relay it downstream.
//!
//! Each stage returns a typed result; the webhook pipeline decides what a failure means for the reply.

mod classify;
mod fetch;
mod relay;
mod store;

pub use classify::{extension_for, FALLBACK_EXTENSION};
pub use fetch::{Credentials, FetchError, FetchedMedia, MediaAuth, MediaFetcher};
pub use relay::{RelayError, RelayResult, RelayUploader};
pub use store::{LocalStore, StoreError, StoredFile};
