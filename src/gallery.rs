//! The gnome band - decorative instrument picker
//!
//! Purely cosmetic: the desktop front end shows which instrument the gnome is
//! playing. Picking one at random takes the RNG as an argument so tests can
//! seed it.

use rand::Rng;

/// Instrument names with a glyph to show for each, sorted by name
pub const INSTRUMENTS: [(&str, &str); 14] = [
    ("Accordion", "🪗"),
    ("Bagpipes", "🎶"),
    ("Bomb", "💣"),
    ("Double Bass", "🎻"),
    ("Drum Sticks", "🥢"),
    ("Drums", "🥁"),
    ("Guitar", "🎸"),
    ("Harp", "🎼"),
    ("Maracas", "🪇"),
    ("Piano", "🎹"),
    ("Saxophone", "🎷"),
    ("Trumpet", "🎺"),
    ("Tuba", "📯"),
    ("Violin", "🎻"),
];

/// Instrument names in display order
pub fn names() -> impl Iterator<Item = &'static str> {
    INSTRUMENTS.iter().map(|(name, _)| *name)
}

/// Glyph for a named instrument
pub fn glyph(name: &str) -> Option<&'static str> {
    INSTRUMENTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, glyph)| *glyph)
}

/// Pick an instrument name at random
pub fn random_instrument<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    INSTRUMENTS[rng.gen_range(0..INSTRUMENTS.len())].0
}
