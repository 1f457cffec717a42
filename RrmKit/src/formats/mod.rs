//! File format handlers
//!
//! - `rrm` - the proprietary RRM container (recovery) and the minimal round-trip layout
//! - `obj` - Wavefront OBJ/MTL interchange

pub mod obj;
pub mod rrm;

pub use obj::{MtlMaterial, ObjWriteOptions, read_obj, write_mtl, write_obj};
pub use rrm::{RawBuffer, RrmHeader, RrmLayout};
