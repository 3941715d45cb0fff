//! Persistence between invocations.

mod state;

pub use state::{PreviousSample, StateStore, StoreError, WORKDIR_ENV};
