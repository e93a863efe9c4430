/// Identifier of one endpoint pair and the path joining it. `0` marks an unused cell.
pub type Label = u32;

/// Glyph used for `label` wherever a single character has to stand in for it.
///
/// Labels 1 through 9 print as digits and 10 through 35 as lowercase base-36 letters; anything larger prints as `?`.
pub(crate) fn glyph(label: Label) -> char {
    char::from_digit(label, 36).unwrap_or('?')
}
