//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed 12-column record schema (`Column`, `COLUMNS`, `Record`)
//! - encoded model input (`EncodedRow`)
//! - the unseen-label policy (`UnseenPolicy`, `UnseenHandling`)
//! - column alignment for named inputs (`ColumnLayout`)
//! - form field definitions shared by the front-ends (`form`)

pub mod form;
pub mod layout;
pub mod types;

pub use form::*;
pub use layout::*;
pub use types::*;
