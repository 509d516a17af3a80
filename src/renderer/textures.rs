use std::path::Path;

use crate::errors::RenderError;
use crate::picture::{LoadState, Picture, PictureId, PictureStore};
use crate::render::Color;
use crate::renderer::DeferredRenderer;

impl DeferredRenderer {
    pub fn pictures(&self) -> &PictureStore {
        &self.pictures
    }

    pub fn picture(&self, id: PictureId) -> Option<&Picture> {
        self.pictures.get(id)
    }

    pub fn picture_state(&self, id: PictureId) -> Option<LoadState> {
        self.pictures.state(id)
    }

    /// Registers a picture whose pixels are decoded on first draw.
    ///
    /// Always returns an id; a picture that could not be read stays inert and draws nothing.
    pub fn lazy_load_picture(&mut self, path: &Path, mask: Option<&Path>, fallback_mask: Option<&Path>) -> PictureId {
        self.pictures.lazy_load(path, mask, fallback_mask)
    }

    /// Like [`lazy_load_picture`](Self::lazy_load_picture) for an image already in memory.
    pub fn lazy_load_picture_bytes(&mut self, raw: Vec<u8>, mask: Option<Vec<u8>>, mask_is_png: bool) -> PictureId {
        self.pictures.lazy_load_bytes(raw, mask, mask_is_png)
    }

    /// Decodes and uploads a picture right away. Eager pictures are never evicted.
    pub fn load_picture(&mut self, path: &Path, mask: Option<&Path>, fallback_mask: Option<&Path>) -> PictureId {
        self.pictures.load(path, mask, fallback_mask, self.backend.as_mut())
    }

    /// Color made transparent when the picture is materialized.
    pub fn set_transparent_color(&mut self, id: PictureId, key: Color) {
        self.pictures.set_transparent_color(id, key);
    }

    /// Decodes and uploads a lazy picture. Returns whether it has a texture afterwards.
    pub fn lazy_load(&mut self, id: PictureId) -> bool {
        self.pictures.materialize(id, self.backend.as_mut())
    }

    /// Drops the texture of a lazy picture, keeping its bytes for the next draw.
    ///
    /// Queued sprites of the picture materialize it again when flushed.
    pub fn lazy_unload(&mut self, id: PictureId) {
        self.pictures.evict(id, self.backend.as_mut());
    }

    /// Materializes a lazy picture ahead of its first draw.
    pub fn lazy_preload(&mut self, id: PictureId) {
        self.pictures.preload(id, self.backend.as_mut());
    }

    /// Frees the texture and forgets the picture. Queued sprites of it are skipped.
    pub fn destroy_picture(&mut self, id: PictureId) {
        self.pictures.destroy(id, self.backend.as_mut());
    }

    /// Destroys every texture held by the backend.
    pub fn clear_all_textures(&mut self) {
        self.pictures.clear_textures(self.backend.as_mut());
    }

    /// Size of [`picture_pixel_data`](Self::picture_pixel_data) for `id`, `0` while it has no texture.
    pub fn picture_pixel_data_size(&self, id: PictureId) -> usize {
        self.pictures.pixel_data_size(id)
    }

    /// RGBA8 texels of a materialized picture, at texture size. Lazy pictures are not materialized for this.
    pub fn picture_pixel_data(&self, id: PictureId) -> Result<Vec<u8>, RenderError> {
        self.pictures.pixel_data(id, self.backend.as_ref())
    }

    /// Bytes uploaded by lazy materialization since the last reset.
    pub fn lazy_loaded_bytes(&self) -> u64 {
        self.pictures.lazy_loaded_bytes()
    }

    pub fn reset_lazy_loaded_bytes(&mut self) {
        self.pictures.reset_lazy_loaded_bytes();
    }
}
