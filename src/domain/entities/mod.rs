//! Core domain entities representing the tracker's data model.
//!
//! Entities are plain data structures; storage and orchestration live in
//! [`crate::infrastructure`] and [`crate::application`].
//!
//! # Entity Types
//!
//! - [`Counter`] - Mention count of a product or user within a frequency bucket
//! - [`ProductRenderer`] - Derived product view for one frequency bucket
//! - [`Banlist`] - Singleton moderation blocklist
//! - [`Product`] / [`TrackedUser`] - First sightings of products and users
//! - [`UrlRecord`] - Short URL to final URL mapping
//! - [`StoreKey`] - Reference to a storefront
//! - [`OperationFlags`] - Singleton bookkeeping for consolidation

pub mod banlist;
pub mod counter;
pub mod operation_flags;
pub mod renderer;
pub mod store;
pub mod tracked;
pub mod url_record;

pub use banlist::Banlist;
pub use counter::{Counter, CounterKind, CounterThresholds};
pub use operation_flags::OperationFlags;
pub use renderer::{ProductRenderer, RendererAttributes};
pub use store::{StoreError, StoreKey, key_for_locale};
pub use tracked::{Product, TrackedUser};
pub use url_record::UrlRecord;
