/// A RGBA `Color`. Each color component is a floating point value
/// with a range from 0 to 1.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Into<u32> for Color {
    fn into(self) -> u32 {
        let color = self.clip();
        let mut encoded = ((color.r * 255.0) as u32) << 24;
        encoded |= ((color.g * 255.0) as u32) << 16;
        encoded |= ((color.b * 255.0) as u32) << 8;
        encoded |= (color.a * 255.0) as u32;
        encoded
    }
}

impl From<u32> for Color {
    fn from(encoded: u32) -> Self {
        Color::new(
            ((encoded >> 24) & 0xFF) as f32 / 255.0,
            ((encoded >> 16) & 0xFF) as f32 / 255.0,
            ((encoded >> 8) & 0xFF) as f32 / 255.0,
            (encoded & 0xFF) as f32 / 255.0,
        )
    }
}

impl Into<[f32; 4]> for Color {
    fn into(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl Color {
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Returns the `grayscale` representation of RGB values.
    pub fn grayscale(&self) -> f32 {
        self.r * 0.299 + self.g * 0.587 + self.b * 0.114
    }

    /// Clip to [0.0, 1.0] range.
    pub fn clip(&self) -> Self {
        Color::new(
            self.r.max(0.0).min(1.0),
            self.g.max(0.0).min(1.0),
            self.b.max(0.0).min(1.0),
            self.a.max(0.0).min(1.0),
        )
    }

    /// Returns a copy with alpha channel replaced.
    pub fn with_alpha(&self, a: f32) -> Self {
        Color::new(self.r, self.g, self.b, a)
    }

    pub fn rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Color {
    pub fn white() -> Self {
        Color::new(1.0, 1.0, 1.0, 1.0)
    }

    pub fn gray() -> Self {
        Color::new(0.5, 0.5, 0.5, 1.0)
    }

    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn red() -> Self {
        Color::new(1.0, 0.0, 0.0, 1.0)
    }

    pub fn green() -> Self {
        Color::new(0.0, 1.0, 0.0, 1.0)
    }

    pub fn blue() -> Self {
        Color::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn yellow() -> Self {
        Color::new(1.0, 1.0, 0.0, 1.0)
    }

    pub fn transparent() -> Self {
        Color::new(0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode() {
        let encoded: u32 = Color::red().into();
        assert_eq!(encoded, 0xFF00_00FF);
        assert_eq!(Color::from(encoded), Color::red());
    }

    #[test]
    fn clip() {
        let c = Color::new(2.0, -1.0, 0.5, 1.0).clip();
        assert_eq!(c, Color::new(1.0, 0.0, 0.5, 1.0));
    }
}
