// SPDX-License-Identifier: MPL-2.0

//! Photo encoding for captured frames
//!
//! Camera backends decode or receive raw sensor data; this module turns it
//! into the encoded bytes the asset store persists.

pub mod encoding;

pub use encoding::{EncodedImage, EncodingFormat, EncodingQuality, PhotoEncoder};
