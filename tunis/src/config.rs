use serde::Deserialize;

fn env_override<T: std::str::FromStr>(name: &str, default: T) -> T {
  std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// The tunables §6 calls out (`TUNIS_CURVE_RECURSION_LIMIT`,
/// `TUNIS_MAX_TEXTURE_SIZE`, `TUNIS_VERTEX_MAX`) plus `devicePixelRatio`,
/// gathered into one struct per SPEC_FULL.md §10.C. `Default` reads
/// environment variable overrides so a host can tune without recompiling;
/// construct with [`Config::from_defaults`] to skip the environment and
/// get exactly the documented constants, or deserialize one from a
/// TOML/JSON config file with `serde`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Cubic subdivision recursion depth cap (§4.B). Default 32.
  pub curve_recursion_limit: u32,
  /// Texture atlas dimension ceiling (§4.I). Default 2048.
  pub max_texture_size: u32,
  /// Per-frame vertex buffer reservation hint (§4.H). Default 16384.
  pub vertex_max: u32,
  /// Device pixel ratio used to derive `tessTol`/`distTol` (§4.B).
  pub device_pixel_ratio: f32,
}

impl Default for Config {
  /// Reads `TUNIS_CURVE_RECURSION_LIMIT`, `TUNIS_MAX_TEXTURE_SIZE`,
  /// `TUNIS_VERTEX_MAX` from the environment, falling back to the
  /// documented defaults when unset or unparseable. `device_pixel_ratio`
  /// is not one of §6's named constants and always defaults to `1.0`;
  /// hosts set it explicitly from their windowing layer.
  fn default() -> Self {
    Self {
      curve_recursion_limit: env_override("TUNIS_CURVE_RECURSION_LIMIT", 32),
      max_texture_size: env_override("TUNIS_MAX_TEXTURE_SIZE", 2048),
      vertex_max: env_override("TUNIS_VERTEX_MAX", 16384),
      device_pixel_ratio: 1.0,
    }
  }
}

impl Config {
  /// The documented defaults with no environment-variable overrides
  /// applied.
  pub fn from_defaults() -> Self {
    Self { curve_recursion_limit: 32, max_texture_size: 2048, vertex_max: 16384, device_pixel_ratio: 1.0 }
  }

  pub(crate) fn flatten_config(&self) -> tunis_painter::FlattenConfig {
    tunis_painter::FlattenConfig::for_device_pixel_ratio(self.device_pixel_ratio, self.curve_recursion_limit)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn documented_defaults_match_the_spec() {
    let cfg = Config::from_defaults();
    assert_eq!(cfg.curve_recursion_limit, 32);
    assert_eq!(cfg.max_texture_size, 2048);
    assert_eq!(cfg.vertex_max, 16384);
    assert_eq!(cfg.device_pixel_ratio, 1.0);
  }
}
