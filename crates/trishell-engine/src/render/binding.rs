use crate::platform::{GpuId, Graphics};

/// A vertex array bound for the lifetime of the guard.
///
/// Dropping the guard unbinds it, so no binding leaks past the draw that
/// needed it.
pub struct BoundVertexArray<'a, G: Graphics + ?Sized> {
    gfx: &'a mut G,
}

impl<'a, G: Graphics + ?Sized> BoundVertexArray<'a, G> {
    pub fn bind(gfx: &'a mut G, vertex_array: GpuId) -> Self {
        gfx.bind_vertex_array(Some(vertex_array));
        Self { gfx }
    }

    pub fn draw_triangles(&mut self, first: u32, count: u32) {
        self.gfx.draw_triangles(first, count);
    }
}

impl<G: Graphics + ?Sized> Drop for BoundVertexArray<'_, G> {
    fn drop(&mut self) {
        self.gfx.bind_vertex_array(None);
    }
}
