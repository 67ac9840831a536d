//! Binary codec layer for converting SlimeWorld saves into Sponge schematics.
//!
//! The decoder side (`slime`) reads `.slime` files (format versions 12 and 13)
//! into an immutable `SlimeWorld`. The encoder side (`schem`) owns a dense
//! block volume and streams it out as gzip-compressed NBT.
//!
//! Nothing here knows what a block *means*. Mapping chunks onto a volume is
//! the caller's job.

pub mod bits;
pub mod error;
pub mod options;
pub mod record;
pub mod schem;
pub mod slime;
pub mod state;
pub mod varint;

pub use error::{FormatError, Result};
pub use options::DecodeOptions;
pub use schem::Schematic;
pub use slime::{SlimeWorld, read_world};
pub use state::BlockState;
