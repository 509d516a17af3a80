use std::collections::HashMap;
use std::path::Path;

use crate::config::TexturePolicy;
use crate::errors::RenderError;
use crate::picture::decode::{self, Prepared};
use crate::picture::{LazySource, LoadState, Picture, PictureId};
use crate::render::backend::{RenderBackend, SurfaceSize};
use crate::render::Color;

/// Owns every picture known to a renderer together with the lazy-texture memory budget.
///
/// Operations that create or release textures take the backend as an
/// argument; the store never holds on to it.
#[derive(Debug, Default)]
pub struct PictureStore {
    pictures: HashMap<PictureId, Picture>,
    policy: TexturePolicy,
    /// Overrides the limit the backend reports.
    max_texture_size: Option<SurfaceSize>,
    /// Bytes of decoded texels materialized from lazy pictures. Never decremented by eviction.
    lazy_loaded_bytes: u64,
}

impl PictureStore {
    pub fn new(policy: TexturePolicy, max_texture_size: Option<SurfaceSize>) -> Self {
        Self { pictures: HashMap::new(), policy, max_texture_size, lazy_loaded_bytes: 0 }
    }

    pub fn get(&self, id: PictureId) -> Option<&Picture> {
        self.pictures.get(&id)
    }

    pub fn state(&self, id: PictureId) -> Option<LoadState> {
        self.pictures.get(&id).map(Picture::state)
    }

    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    /// Registers a lazy picture from a file. Only the image header is parsed.
    ///
    /// `mask` is a classic luminance mask, `fallback_mask` a PNG whose alpha is
    /// used when `mask` is absent or unreadable. Masks are ignored for PNG
    /// images. On failure the returned picture stays not-inited, which makes
    /// drawing it a no-op.
    pub fn lazy_load(&mut self, path: &Path, mask: Option<&Path>, fallback_mask: Option<&Path>) -> PictureId {
        let mut pic = Picture::new(Some(path));
        let id = pic.id();

        match read_lazy_source(path, mask, fallback_mask) {
            Ok(source) => init_lazy(&mut pic, source),
            Err(e) => log::warn!("cannot lazy-load {}: {e}", path.display()),
        }

        self.pictures.insert(id, pic);
        id
    }

    /// Registers a lazy picture from encoded bytes already in memory.
    pub fn lazy_load_bytes(&mut self, raw: Vec<u8>, mask: Option<Vec<u8>>, mask_is_png: bool) -> PictureId {
        let mut pic = Picture::new(None);
        let id = pic.id();

        let source = LazySource { raw, mask: mask.unwrap_or_default(), mask_is_png };
        init_lazy(&mut pic, source);

        self.pictures.insert(id, pic);
        id
    }

    /// Decodes and uploads a picture right away. The raw bytes are not kept.
    ///
    /// Eager pictures do not count towards the lazy memory budget and cannot
    /// be evicted.
    pub fn load(&mut self, path: &Path, mask: Option<&Path>, fallback_mask: Option<&Path>, backend: &mut dyn RenderBackend) -> PictureId {
        let limit = self.texture_limit(backend);
        let mut pic = Picture::new(Some(path));
        let id = pic.id();

        let prepared = read_lazy_source(path, mask, fallback_mask)
            .and_then(|source| decode::prepare(&source, None, &self.policy, limit));

        match prepared {
            Ok(Some(prepared)) => {
                if upload(&mut pic, prepared, backend) {
                    pic.inited = true;
                }
            }
            Ok(None) => log::warn!("image {} has zero size", path.display()),
            Err(e) => log::error!("cannot load {}: {e}", path.display()),
        }

        self.pictures.insert(id, pic);
        id
    }

    /// Registers the color treated as transparent on the next materialize.
    pub fn set_transparent_color(&mut self, id: PictureId, key: Color) {
        if let Some(pic) = self.pictures.get_mut(&id) {
            pic.color_key = Some(key);
        }
    }

    /// Decodes a lazy picture and hands its texels to `backend`.
    ///
    /// Returns whether the picture holds a texture afterwards. Materializing a
    /// materialized picture does nothing.
    pub fn materialize(&mut self, id: PictureId, backend: &mut dyn RenderBackend) -> bool {
        let limit = self.texture_limit(backend);

        let Some(pic) = self.pictures.get_mut(&id) else {
            return false;
        };

        if pic.texture.is_some() {
            return true;
        }

        if !pic.inited {
            return false;
        }

        let Some(source) = pic.lazy.as_ref() else {
            return false;
        };

        let prepared = match decode::prepare(source, pic.color_key, &self.policy, limit) {
            Ok(Some(prepared)) => prepared,
            Ok(None) => {
                log::warn!("lazy picture {} decoded to zero size", describe(pic));
                return false;
            }
            Err(e) => {
                log::error!("cannot decode lazy picture {}: {e}", describe(pic));
                return false;
            }
        };

        let mut bytes = prepared.decoded.width as u64 * prepared.decoded.height as u64 * 4;
        if prepared.has_mask {
            bytes *= 2;
        }
        self.lazy_loaded_bytes += bytes;

        log::debug!("materializing {} ({}x{})", describe(pic), prepared.plan.width, prepared.plan.height);
        upload(pic, prepared, backend)
    }

    /// Destroys the texture of a materialized lazy picture, keeping its raw bytes.
    pub fn evict(&mut self, id: PictureId, backend: &mut dyn RenderBackend) {
        let Some(pic) = self.pictures.get_mut(&id) else {
            return;
        };

        if pic.lazy.is_none() {
            return;
        }

        if let Some(handle) = pic.texture.take() {
            backend.destroy_texture(handle);
            pic.reset_colors();
            pic.warned_empty = false;
        }
    }

    /// Materializes a lazy picture ahead of its first draw.
    pub fn preload(&mut self, id: PictureId, backend: &mut dyn RenderBackend) {
        if self.state(id) == Some(LoadState::Lazy) {
            self.materialize(id, backend);
        }
    }

    /// Removes a picture for good, releasing its texture.
    pub fn destroy(&mut self, id: PictureId, backend: &mut dyn RenderBackend) {
        if let Some(pic) = self.pictures.remove(&id) {
            if let Some(handle) = pic.texture {
                backend.destroy_texture(handle);
            }
        }
    }

    /// Releases every texture. Lazy pictures fall back to their raw bytes; eager ones become not-inited.
    pub fn clear_textures(&mut self, backend: &mut dyn RenderBackend) {
        for pic in self.pictures.values_mut() {
            if let Some(handle) = pic.texture.take() {
                backend.destroy_texture(handle);
            }

            if pic.lazy.is_none() {
                pic.inited = false;
            }
        }

        backend.clear_all_textures();
    }

    /// Length of the buffer [`pixel_data`](Self::pixel_data) returns, `0` without a texture.
    pub fn pixel_data_size(&self, id: PictureId) -> usize {
        match self.pictures.get(&id) {
            Some(pic) if pic.texture.is_some() => pic.width as usize * pic.height as usize * 4,
            _ => 0,
        }
    }

    /// Reads the texels of a materialized picture back from `backend`, RGBA8 at texture size.
    pub fn pixel_data(&self, id: PictureId, backend: &dyn RenderBackend) -> Result<Vec<u8>, RenderError> {
        let pic = self.pictures.get(&id).ok_or_else(|| RenderError::Texture(format!("unknown picture {id:?}")))?;
        let handle = pic.texture.ok_or_else(|| RenderError::Texture(format!("{} has no texture", describe(pic))))?;

        let texels = backend
            .read_texture(handle)
            .map_err(|e| RenderError::Texture(format!("cannot read back {}: {e:#}", describe(pic))))?;
        if texels.len() != self.pixel_data_size(id) {
            return Err(RenderError::Texture(format!(
                "{} returned {} bytes for a {}x{} texture",
                backend.name(),
                texels.len(),
                pic.width,
                pic.height
            )));
        }

        Ok(texels)
    }

    pub fn lazy_loaded_bytes(&self) -> u64 {
        self.lazy_loaded_bytes
    }

    pub fn reset_lazy_loaded_bytes(&mut self) {
        self.lazy_loaded_bytes = 0;
    }

    /// Makes sure `id` can be drawn, materializing it when lazy.
    ///
    /// A picture that still has no texture is reported once with a warning
    /// and skipped afterwards.
    /// Returns `id` when a sprite of it may be submitted. A not-inited picture is reported once.
    pub(crate) fn drawable(&mut self, id: PictureId) -> Option<&Picture> {
        let pic = self.pictures.get_mut(&id)?;
        if !pic.inited {
            warn_empty_once(pic);
            return None;
        }
        Some(&*pic)
    }

    pub(crate) fn prepare_for_draw(&mut self, id: PictureId, backend: &mut dyn RenderBackend) -> Option<&Picture> {
        if self.state(id)? == LoadState::Lazy {
            self.materialize(id, backend);
        }

        let pic = self.pictures.get_mut(&id)?;
        if pic.texture.is_none() {
            warn_empty_once(pic);
            return None;
        }

        Some(&*pic)
    }

    fn texture_limit(&self, backend: &dyn RenderBackend) -> SurfaceSize {
        self.max_texture_size.unwrap_or_else(|| backend.max_texture_size())
    }
}

fn describe(pic: &Picture) -> String {
    match pic.path() {
        Some(path) => path.display().to_string(),
        None => format!("{:?}", pic.id()),
    }
}

fn warn_empty_once(pic: &mut Picture) {
    if !pic.warned_empty {
        log::warn!("attempt to draw an empty picture {}", describe(pic));
        pic.warned_empty = true;
    }
}

fn read_lazy_source(path: &Path, mask: Option<&Path>, fallback_mask: Option<&Path>) -> Result<LazySource, RenderError> {
    let raw = std::fs::read(path)?;
    let mut source = LazySource { raw, mask: Vec::new(), mask_is_png: false };

    if !decode::uses_mask(path) {
        return Ok(source);
    }

    if let Some(mask) = mask {
        match std::fs::read(mask) {
            Ok(bytes) => source.mask = bytes,
            Err(e) => log::debug!("no mask at {}: {e}", mask.display()),
        }
    }

    if source.mask.is_empty() {
        if let Some(fallback) = fallback_mask {
            match std::fs::read(fallback) {
                Ok(bytes) => {
                    source.mask = bytes;
                    source.mask_is_png = true;
                }
                Err(e) => log::debug!("no fallback mask at {}: {e}", fallback.display()),
            }
        }
    }

    Ok(source)
}

fn init_lazy(pic: &mut Picture, source: LazySource) {
    match decode::read_metrics(&source.raw) {
        Ok(size) if size.width > 0 && size.height > 0 => {
            pic.width = size.width;
            pic.height = size.height;
            pic.lazy = Some(source);
            pic.inited = true;
        }
        Ok(_) => log::warn!("image {} has zero size", describe(pic)),
        Err(e) => log::warn!("cannot read metrics of {}: {e}", describe(pic)),
    }
}

fn upload(pic: &mut Picture, prepared: Prepared, backend: &mut dyn RenderBackend) -> bool {
    let Prepared { image, plan, upper, lower, .. } = prepared;
    let (w, h) = (plan.width, plan.height);

    match backend.materialize_texture(image.as_raw(), w, h, w * 4) {
        Ok(handle) => {
            pic.texture = Some(handle);
            pic.width = w;
            pic.height = h;
            if let Some(orig) = plan.orig {
                pic.orig_width = orig.width;
                pic.orig_height = orig.height;
            }
            (pic.w_scale, pic.h_scale) = plan.scale();
            pic.color_upper = upper;
            pic.color_lower = lower;
            true
        }
        Err(e) => {
            log::warn!("{} failed to create a {w}x{h} texture for {}: {e}", backend.name(), describe(pic));
            false
        }
    }
}
