//! Source adapters and the plumbing they share.
//!
//! This module contains:
//! - The `SourceAdapter` trait that all sources implement
//! - HTTP helpers (`http`) and payload decoding helpers (`decode`)
//! - Concrete sources (BOC, CIB, CGB, CITIC, CMB, UnionPay)
//!
//! # Architecture
//!
//! Each adapter owns its transport and decode quirks and returns the raw
//! quote in its own base unit. Normalization, ranking and conversion happen
//! outside the adapters, so a new source only has to implement
//! `SourceAdapter` and be added to the registry.
//!
//! Adapters resolve the user query with the shared `CurrencyResolver`
//! themselves, because row labels differ per source.

mod decode;
mod http;
mod traits;

pub mod boc;
pub mod cgb;
pub mod cib;
pub mod citic;
pub mod cmb;
pub mod unionpay;

// Re-exports
pub use boc::BocSource;
pub use cgb::CgbSource;
pub use cib::CibSource;
pub use citic::CiticSource;
pub use cmb::CmbSource;
pub use traits::SourceAdapter;
pub use unionpay::UnionPaySource;
