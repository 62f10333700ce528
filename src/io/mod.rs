//! Binary data streams and the serialization of shaders and effects.

pub mod archive;
pub mod data;

pub use self::archive::{shader_from_json, shader_to_json, Archive, Imported};
pub use self::data::{DataReader, DataWriter, Endianness};
