/// Width/height pair, used for pixel dimensions and swapchain/depth comparisons.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    #[inline]
    pub const fn new(width: T, height: T) -> Self {
        Self { width, height }
    }

    /// Applies `f` to both components.
    #[inline]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Size<U> {
        Size::new(f(self.width), f(self.height))
    }

    /// Lossless conversion to another integer width; `None` if either component does not fit.
    #[inline]
    pub fn try_cast<U: TryFrom<T>>(self) -> Option<Size<U>> {
        Some(Size::new(
            U::try_from(self.width).ok()?,
            U::try_from(self.height).ok()?,
        ))
    }
}

impl<T: Copy + PartialOrd + Default> Size<T> {
    /// True when either side is zero (or negative).
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= T::default() || self.height <= T::default()
    }
}

impl Size<u32> {
    /// Converts to signed pixels, clamping anything beyond `i32::MAX`.
    #[inline]
    pub fn to_i32(self) -> Size<i32> {
        self.map(|v| i32::try_from(v).unwrap_or(i32::MAX))
    }

    /// Width over height, with the height clamped to at least one pixel.
    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Size<i32> {
    /// Converts to unsigned pixels, clamping negative components to zero.
    #[inline]
    pub fn to_u32(self) -> Size<u32> {
        self.map(|v| u32::try_from(v).unwrap_or(0))
    }
}

impl<T> From<(T, T)> for Size<T> {
    #[inline]
    fn from((width, height): (T, T)) -> Self {
        Self::new(width, height)
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Size<u32> {
    #[inline]
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_componentwise() {
        assert_eq!(Size::new(640u32, 480), Size::from((640, 480)));
        assert_ne!(Size::new(640u32, 480), Size::new(480, 640));
    }

    #[test]
    fn try_cast_rejects_values_that_do_not_fit() {
        assert_eq!(Size::new(800i32, 600).try_cast::<u32>(), Some(Size::new(800u32, 600)));
        assert_eq!(Size::new(-1i32, 600).try_cast::<u32>(), None);
        assert_eq!(Size::new(u32::MAX, 1).try_cast::<i32>(), None);
    }

    #[test]
    fn signed_unsigned_conversions_clamp() {
        assert_eq!(Size::new(u32::MAX, 7).to_i32(), Size::new(i32::MAX, 7));
        assert_eq!(Size::new(-5, 7).to_u32(), Size::new(0, 7));
    }

    #[test]
    fn aspect_guards_zero_height() {
        assert_eq!(Size::new(640u32, 0).aspect(), 640.0);
        assert_eq!(Size::new(800u32, 400).aspect(), 2.0);
    }

    #[test]
    fn is_empty_checks_either_side() {
        assert!(Size::new(0u32, 10).is_empty());
        assert!(Size::new(10i32, -1).is_empty());
        assert!(!Size::new(1u32, 1).is_empty());
    }
}
