/* CDR Reference Codec
 *
 * Encodes and decodes dynamic values against a `cdr_types::TypeArena`
 * with exactly the wire bytes, acceptance rules and annotation outcomes
 * of the generated C and C++ routines. Used to cross-check generated code
 * and to inspect buffers without compiling anything.
 */

pub mod annotations;
pub mod decoder;
pub mod encoder;
pub mod errors;
mod primitives;
pub mod value;

pub use annotations::{transform, validate};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use errors::{ReflectError, ReflectResult};
pub use value::{UnionValue, Value};
