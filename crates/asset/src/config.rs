//! Options applied to every model a loader produces.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Center X/Z on their midpoints and put the lowest Y at 0.
    pub centered: bool,
    /// Emit `1 - v` texture coordinates in the draw batch.
    pub flip_texture_vertically: bool,
}

impl LoadOptions {
    pub fn with_centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn with_flip_texture_vertically(mut self, flip: bool) -> Self {
        self.flip_texture_vertically = flip;
        self
    }
}
