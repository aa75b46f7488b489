//! Sharing metadata for session links.

pub mod metadata;

pub use metadata::{share_url, ShareMetadata, HOME_TITLE, SITE_NAME};
