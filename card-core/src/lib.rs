//! # Verse Card Core
//!
//! Data model for composing verse cards: a background image, a quoted verse,
//! and the layered card derived from them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├──────────────────────┬──────────────────────┤
//! │  Inputs              │  Derived             │
//! │  - Verse             │  - Card (layers)     │
//! │  - ImageRef          │  - Download filename │
//! │  - Upload validation │  - Share action      │
//! ├──────────────────────┴──────────────────────┤
//! │  EditorStore: per-session selection state   │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod card;
pub mod editor;
pub mod error;
pub mod image;
pub mod layout;
pub mod share;
pub mod store;
pub mod verse;

pub use card::{compose, Background, Card, Color, Content, Decoration, CARD_ELEMENT_ID};
pub use editor::{CardEditor, EditorSnapshot, ImageSummary};
pub use error::{CardError, CardResult};
pub use image::{accept_upload, check_media_type, ImageRef, MAX_UPLOAD_BYTES};
pub use share::{download_filename, plan_share, share_text, ShareAction, SharePayload};
pub use store::{EditorStore, ExportPermit};
pub use verse::{popular_verse, popular_verses, Verse, VerseOrigin};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
