use guillotiere::{Allocation, AtlasAllocator, Size};
use tunis_algo::FrameCache;
use tunis_painter::ImageHandle;

use crate::error::GpuError;

/// A single large RGBA8 texture partitioned into rectangular sub-images.
/// Per SPEC_FULL.md §4.I, each allocation carries a padding border
/// (`maxTexSize/64`, replicated from the image's own edge pixels) so
/// bilinear filtering at a sub-image's boundary can't bleed into its
/// neighbor. Entries are evicted on `end_frame` if not `store`d again that
/// frame, the same frame-scoped lifetime [`FrameCache`] gives everything
/// else in this pipeline.
pub struct TextureAtlas {
  allocator: AtlasAllocator,
  pixels: Vec<u8>,
  size: i32,
  max_size: i32,
  padding: i32,
  allocated: FrameCache<ImageHandle, Allocation>,
  white_texel: Allocation,
  dirty: bool,
}

impl TextureAtlas {
  pub fn new(init_size: u32, max_size: u32) -> Self {
    let size = init_size as i32;
    let mut allocator = AtlasAllocator::new(Size::new(size, size));
    let white_texel = allocator.allocate(Size::new(1, 1)).expect("a fresh atlas has room for one texel");

    let mut atlas = Self {
      allocator,
      pixels: vec![0u8; (size * size * 4) as usize],
      size,
      max_size: max_size as i32,
      padding: (max_size / 64).max(1) as i32,
      allocated: FrameCache::new(),
      white_texel,
      dirty: true,
    };
    let wx = white_texel.rectangle.min.x;
    let wy = white_texel.rectangle.min.y;
    atlas.write_rect(wx, wy, 1, 1, &[255, 255, 255, 255]);
    atlas
  }

  /// The always-resident 1x1 opaque-white texel solid-color fills sample,
  /// letting solid and textured draws share one shader and batch.
  pub fn white_texel(&self) -> Allocation { self.white_texel }

  /// Looks up an already-`store`d image's allocation without inserting
  /// anything, marking it hit for this frame. `None` if the image was
  /// never stored (e.g. still decoding, or decode failed) — the batcher's
  /// policy (SPEC_FULL.md §7) is to skip the draw and log a warning.
  pub fn lookup(&mut self, key: &ImageHandle) -> Option<Allocation> { self.allocated.get(key).copied() }

  /// Looks up or allocates room for `key`, writing `pixels` (tightly
  /// packed RGBA8, `width * height * 4` bytes) into the atlas on first
  /// insertion. Returns the same allocation on every call within a frame
  /// as long as `key` keeps being `store`d (identity-compared).
  pub fn store(&mut self, key: ImageHandle, width: u32, height: u32, pixels: &[u8]) -> Result<Allocation, GpuError> {
    if let Some(alloc) = self.allocated.get(&key) {
      return Ok(*alloc);
    }

    let padded = Size::new(width as i32 + self.padding * 2, height as i32 + self.padding * 2);
    if padded.width > self.max_size || padded.height > self.max_size {
      return Err(GpuError::ImageTooLargeForAtlas { width, height });
    }

    let alloc = loop {
      if let Some(alloc) = self.allocator.allocate(padded) {
        break alloc;
      }
      if !self.grow() {
        return Err(GpuError::AtlasOutOfSpace);
      }
    };

    let x0 = alloc.rectangle.min.x + self.padding;
    let y0 = alloc.rectangle.min.y + self.padding;
    self.write_rect(x0, y0, width, height, pixels);
    self.replicate_border(x0, y0, width, height);

    self.allocated.insert(key, alloc);
    self.dirty = true;
    Ok(alloc)
  }

  /// Deallocates every sub-image not `store`d again since the previous
  /// call.
  pub fn end_frame(&mut self) {
    let before: Vec<(ImageHandle, Allocation)> = self.allocated.iter().map(|(k, v)| (k.clone(), *v)).collect();
    self.allocated.frame_end();
    for (key, alloc) in before {
      if !self.allocated.contains_key(&key) {
        self.allocator.deallocate(alloc.id);
      }
    }
  }

  pub fn pixels(&self) -> &[u8] { &self.pixels }

  pub fn size(&self) -> u32 { self.size as u32 }

  /// Returns whether the atlas changed since the last call, clearing the
  /// flag — callers use this to decide whether to re-upload / regenerate
  /// mipmaps for the bound texture.
  pub fn take_dirty(&mut self) -> bool { std::mem::replace(&mut self.dirty, false) }

  fn grow(&mut self) -> bool {
    if self.size >= self.max_size {
      return false;
    }
    let new_size = (self.size * 2).min(self.max_size);
    self.allocator.grow(Size::new(new_size, new_size));

    let mut grown = vec![0u8; (new_size * new_size * 4) as usize];
    let old_stride = self.size as usize * 4;
    let new_stride = new_size as usize * 4;
    for y in 0..self.size as usize {
      let old_row = y * old_stride..y * old_stride + old_stride;
      let new_row = y * new_stride..y * new_stride + old_stride;
      grown[new_row].copy_from_slice(&self.pixels[old_row]);
    }
    self.pixels = grown;
    self.size = new_size;
    true
  }

  fn write_rect(&mut self, x0: i32, y0: i32, width: u32, height: u32, pixels: &[u8]) {
    let stride = self.size as usize * 4;
    for row in 0..height as usize {
      let src = row * width as usize * 4..(row + 1) * width as usize * 4;
      let dst = (y0 as usize + row) * stride + x0 as usize * 4;
      self.pixels[dst..dst + width as usize * 4].copy_from_slice(&pixels[src]);
    }
  }

  /// Replicates the sub-image's own edge pixels outward into its padding
  /// border, corners included.
  fn replicate_border(&mut self, x0: i32, y0: i32, width: u32, height: u32) {
    let stride = self.size as usize * 4;
    let (w, h) = (width as i32, height as i32);
    for py in -self.padding..h + self.padding {
      let src_y = py.clamp(0, h - 1);
      for px in -self.padding..w + self.padding {
        if (0..h).contains(&py) && (0..w).contains(&px) {
          continue;
        }
        let src_x = px.clamp(0, w - 1);
        let src = (y0 + src_y) as usize * stride + (x0 + src_x) as usize * 4;
        let dst = (y0 + py) as usize * stride + (x0 + px) as usize * 4;
        if dst + 4 > self.pixels.len() || src + 4 > self.pixels.len() {
          continue;
        }
        let texel = [self.pixels[src], self.pixels[src + 1], self.pixels[src + 2], self.pixels[src + 3]];
        self.pixels[dst..dst + 4].copy_from_slice(&texel);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn solid(color: [u8; 4], w: u32, h: u32) -> Vec<u8> { color.repeat((w * h) as usize) }

  #[test]
  fn storing_the_same_key_twice_returns_the_same_allocation() {
    let mut atlas = TextureAtlas::new(256, 2048);
    let key: ImageHandle = tunis_algo::Resource::new(1u32);
    let pixels = solid([255, 0, 0, 255], 8, 8);
    let a = atlas.store(key.clone(), 8, 8, &pixels).unwrap();
    let b = atlas.store(key, 8, 8, &pixels).unwrap();
    assert_eq!(a.id, b.id);
  }

  #[test]
  fn unused_allocation_is_freed_after_end_frame() {
    let mut atlas = TextureAtlas::new(256, 2048);
    let key: ImageHandle = tunis_algo::Resource::new(2u32);
    let pixels = solid([0, 255, 0, 255], 8, 8);
    atlas.store(key.clone(), 8, 8, &pixels).unwrap();
    atlas.end_frame();
    assert!(!atlas.allocated.contains_key(&key));
  }

  #[test]
  fn border_pixels_replicate_the_image_edge() {
    let mut atlas = TextureAtlas::new(256, 2048);
    let key: ImageHandle = tunis_algo::Resource::new(3u32);
    let pixels = solid([10, 20, 30, 255], 4, 4);
    let alloc = atlas.store(key, 4, 4, &pixels).unwrap();
    let stride = atlas.size() as usize * 4;
    let x0 = alloc.rectangle.min.x + atlas.padding;
    let y0 = alloc.rectangle.min.y + atlas.padding;
    let border = (y0 as usize) * stride + (x0 as usize - 1) * 4;
    assert_eq!(&atlas.pixels()[border..border + 4], &[10, 20, 30, 255]);
  }

  #[test]
  fn image_larger_than_max_size_is_rejected() {
    let mut atlas = TextureAtlas::new(64, 128);
    let key: ImageHandle = tunis_algo::Resource::new(4u32);
    let pixels = solid([1, 2, 3, 255], 200, 200);
    assert!(matches!(
      atlas.store(key, 200, 200, &pixels),
      Err(GpuError::ImageTooLargeForAtlas { .. })
    ));
  }
}
