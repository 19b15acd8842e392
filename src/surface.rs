//! Drawing surfaces the gauge renders onto.

use crate::config::Placement;
use crate::scene::Canvas;

/// A drawing target owned by the gauge.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    /// The pixel target, or `None` while the backing store is not attached yet.
    fn canvas(&mut self) -> Option<Canvas<'_>>;
    /// Release the backing store. The surface stays detached afterwards.
    fn destroy(&mut self);
}

/// In-memory RGBA8 surface, usable as a texture by whatever composites it.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    placement: Placement,
    visible: bool,
    frame: Option<Vec<u8>>,
    destroyed: bool,
}

impl PixelSurface {
    /// A detached surface; call [`attach`](Self::attach) once the host is ready for it.
    pub fn new(width: usize, height: usize, placement: Placement) -> Self {
        Self {
            width,
            height,
            placement,
            visible: true,
            frame: None,
            destroyed: false,
        }
    }

    /// A surface that is attached straight away.
    pub fn attached(width: usize, height: usize, placement: Placement) -> Self {
        let mut surface = Self::new(width, height, placement);
        surface.attach();
        surface
    }

    /// Allocate the backing store. No-op once attached or destroyed.
    pub fn attach(&mut self) {
        if self.frame.is_none() && !self.destroyed {
            self.frame = Some(vec![0; self.width * self.height * 4]);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.frame.is_some()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Raw RGBA pixels, row-major.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.frame.as_deref()
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn canvas(&mut self) -> Option<Canvas<'_>> {
        let (width, height) = (self.width, self.height);
        self.frame
            .as_deref_mut()
            .map(|frame| Canvas::new(frame, width, height))
    }

    fn destroy(&mut self) {
        self.frame = None;
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_unavailable_until_attached() {
        let mut surface = PixelSurface::new(4, 4, Placement::default());
        assert!(surface.canvas().is_none());
        assert!(surface.pixels().is_none());

        surface.attach();
        assert!(surface.canvas().is_some());
        assert_eq!(surface.pixels().map(<[u8]>::len), Some(64));
    }

    #[test]
    fn test_visibility_toggle() {
        let mut surface = PixelSurface::attached(2, 2, Placement::default());
        assert!(surface.is_visible());
        surface.hide();
        assert!(!surface.is_visible());
        surface.show();
        assert!(surface.is_visible());
    }

    #[test]
    fn test_destroy_detaches_for_good() {
        let mut surface = PixelSurface::attached(2, 2, Placement::default());
        surface.destroy();
        assert!(surface.canvas().is_none());
        surface.attach();
        assert!(!surface.is_attached());
    }
}
