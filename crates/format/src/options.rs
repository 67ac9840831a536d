/// Knobs for the decoder.
///
/// The default is tolerant: corrupt packed data resolves to the first palette
/// entry and malformed entity blocks become empty lists, which matches what
/// existing `.slime` tooling accepts. `strict` turns both into errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub strict: bool,
}

impl DecodeOptions {
    pub const fn strict() -> Self {
        Self { strict: true }
    }

    pub const fn tolerant() -> Self {
        Self { strict: false }
    }
}
