//! PDF Image Extractor
//!
//! Pulls every embedded raster image out of an uploaded PDF and hands the
//! images back as data URIs, with a companion endpoint that packs a chosen
//! subset into a ZIP.
//!
//! # Modules
//!
//! - `extract`: Extraction pipeline and image normalization
//! - `pdf`: Document access via lopdf
//! - `archive`: ZIP packing
//! - `routes`: HTTP surface

pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod pdf;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;
