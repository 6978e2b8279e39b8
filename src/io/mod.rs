//! File-level collaborators of the pipeline
//!
//! Reading and decoding input files, finding them on disk, checking their
//! names against a model's precondition and listing the outputs.

pub mod decode;
pub mod discovery;
pub mod manifest;
pub mod naming;

pub use decode::{FALLBACK_ENCODINGS, TextEncoding, decode_json, read_json_file};
pub use discovery::find_geojson_files;
pub use manifest::{ManifestEntry, build_manifest, write_manifest};
pub use naming::check_file_name;
