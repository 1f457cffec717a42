//! Wavefront OBJ/MTL interchange.

mod reader;
mod writer;

pub use reader::read_obj;
pub use writer::{MATERIAL_NAME, MtlMaterial, ObjWriteOptions, save_obj_with_mtl, write_mtl, write_obj};
pub(crate) use writer::write_atomically;
