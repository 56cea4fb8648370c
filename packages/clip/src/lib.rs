//! Loader for `.acl.js` skinned-skeleton animation clips.
//!
//! Reading goes through four stages: the text is tokenized and parsed into a
//! generic tree (`animclip-parser`), the [`binder`] types that tree into clip
//! header, bones and tracks, and the [`validator`] checks the skeleton and
//! track invariants. The result is either a [`Clip`] or every problem found,
//! as [`ClipErrors`].
//!
//! ```no_run
//! use animclip::ClipReader;
//!
//! let source = std::fs::read_to_string("walk.acl.js").unwrap();
//! match ClipReader::new().with_source_name("walk.acl.js").read(&source) {
//!     Ok(clip) => println!("{} bones", clip.bones().len()),
//!     Err(errors) => eprintln!("{}", errors),
//! }
//! ```

pub mod binder;
pub mod config;
pub mod decompress;
pub mod error;
pub mod model;
pub mod reader;
pub mod validator;
pub mod writer;

#[cfg(test)]
mod tests_scenarios;

pub use binder::{Binder, RawClip};
pub use config::{ConfigError, ReaderConfig};
#[cfg(feature = "zip")]
pub use decompress::ZipDecompressor;
pub use decompress::Decompressor;
#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
pub use error::{ClipError, ClipErrors, DecompressError, ErrorKind};
pub use model::{AdditiveFormat, Bone, Clip, ClipHeader, ReferenceFrame, SequenceKind, Track};
pub use reader::{clip_name_from_path, read_clip, ClipReader};
pub use validator::{ValidationContext, ValidationRule, Validator};
pub use writer::{to_syntax, write_clip};

pub use animclip_parser::{ParseError, Position};
