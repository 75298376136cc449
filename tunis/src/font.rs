use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

/// One glyph's atlas placement and advance metrics. The atlas bounds are
/// filled in once the glyph has actually been rasterized and stored; §9's
/// open question leaves glyph rasterization itself as a no-op stub, so
/// every glyph loaded from `fonts.tfp` starts with `atlas_bounds: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
  pub advance: f32,
  pub bearing_x: f32,
  pub bearing_y: f32,
  pub atlas_bounds: Option<(f32, f32, f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
  pub family: String,
  pub weight: u16,
  pub italic: bool,
  pub glyphs: HashMap<u32, Glyph, RandomState>,
}

/// The `fonts.tfp` schema (SPEC_FULL.md §6, §10.D). The original stores
/// this in FlatBuffers; this workspace's idiom for a structured binary
/// blob is `serde` + `bincode`, so the wire format here is whatever
/// `bincode::serialize` produces for this struct — an implementation
/// decision recorded in DESIGN.md, not part of the spec itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontRepository {
  pub fonts: Vec<Font>,
}

impl FontRepository {
  pub fn load(bytes: &[u8]) -> Result<Self, bincode::Error> { bincode::deserialize(bytes) }

  pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> { bincode::serialize(self) }

  /// Font selection (§6, §10.G): first an exact `(family, weight, italic)`
  /// match; else the first same-family candidate whose weight is at most
  /// the requested weight and whose italic flag matches; else the first
  /// same-family candidate at all; else `None`. Missing font is non-fatal
  /// per §7 — callers log and no-op rather than propagate an error.
  pub fn lookup(&self, family: &str, weight: u16, italic: bool) -> Option<&Font> {
    if let Some(exact) = self.fonts.iter().find(|f| f.family == family && f.weight == weight && f.italic == italic) {
      return Some(exact);
    }
    if let Some(close) = self
      .fonts
      .iter()
      .filter(|f| f.family == family && f.weight <= weight && f.italic == italic)
      .max_by_key(|f| f.weight)
    {
      return Some(close);
    }
    self.fonts.iter().find(|f| f.family == family)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn font(family: &str, weight: u16, italic: bool) -> Font { Font { family: family.into(), weight, italic, glyphs: HashMap::default() } }

  #[test]
  fn exact_match_wins_over_everything_else() {
    let repo = FontRepository { fonts: vec![font("Sans", 400, false), font("Sans", 700, false)] };
    let found = repo.lookup("Sans", 700, false).unwrap();
    assert_eq!(found.weight, 700);
  }

  #[test]
  fn falls_back_to_heaviest_same_family_weight_at_or_under_request() {
    let repo = FontRepository { fonts: vec![font("Sans", 300, false), font("Sans", 400, false), font("Sans", 900, false)] };
    let found = repo.lookup("Sans", 600, false).unwrap();
    assert_eq!(found.weight, 400);
  }

  #[test]
  fn falls_back_to_any_same_family_when_none_match_weight_or_italic() {
    let repo = FontRepository { fonts: vec![font("Sans", 900, true)] };
    let found = repo.lookup("Sans", 100, false).unwrap();
    assert_eq!(found.weight, 900);
  }

  #[test]
  fn unknown_family_returns_none() {
    let repo = FontRepository { fonts: vec![font("Sans", 400, false)] };
    assert!(repo.lookup("Serif", 400, false).is_none());
  }

  #[test]
  fn round_trips_through_bincode() {
    let repo = FontRepository { fonts: vec![font("Sans", 400, false)] };
    let bytes = repo.to_bytes().unwrap();
    let back = FontRepository::load(&bytes).unwrap();
    assert_eq!(repo, back);
  }
}
