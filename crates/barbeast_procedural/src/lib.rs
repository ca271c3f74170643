//! # BARBEAST Procedural Derivation
//!
//! Deterministic derivation of creature attributes from scanned barcodes.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same barcode always produces the same seed, rarity and terrain
//! 2. **Canonical**: EAN-13, UPC-A and EAN-8 inputs collapse to one 13-digit form
//! 3. **Pure**: No clocks, no randomness, no global state
//!
//! ## Core Components
//!
//! - `normalize_to_ean13`: Cleans and validates raw scanner input
//! - `EntitySeed`: Integer seed with rarity and motif partitions
//! - `Terrain`: Battle terrain and its integer combat modifiers
//!
//! ## Example
//!
//! ```rust
//! use barbeast_procedural::{normalize_to_ean13, BarcodeTraits, Terrain};
//!
//! let code = normalize_to_ean13("0-12345-67890-5").unwrap();
//! assert_eq!(code.as_str(), "0012345678905");
//!
//! let traits = BarcodeTraits::derive(&code);
//! assert_eq!(traits.terrain, Terrain::Library);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod barcode;
pub mod seed;
pub mod terrain;

pub use barcode::{
    normalize_to_ean13, BarcodeError, BarcodeFormat, BarcodeRejection, BarcodeResult,
    CanonicalBarcode,
};
pub use seed::{derive_seed, BarcodeTraits, EntitySeed, Motif, RarityTier};
pub use terrain::{apply_terrain_modifiers, terrain_from_barcode, Terrain};
