/// 32-bit ARGB color, laid out as `0xAARRGGBB`.
///
/// In memory the value is B, G, R, A, which is what a 32 bpp RGB
/// framebuffer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Color(u32);

impl Color {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::argb(0xFF, red, green, blue)
    }

    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color(u32::from_be_bytes([alpha, red, green, blue]))
    }

    pub const fn from_argb(value: u32) -> Self {
        Color(value)
    }

    /// `0xRRGGBB`, fully opaque.
    pub const fn from_hex(rgb: u32) -> Self {
        Color(0xFF00_0000 | (rgb & 0x00FF_FFFF))
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY_100: Color = Color::rgb(245, 245, 245);
    pub const GRAY_200: Color = Color::rgb(238, 238, 238);
    pub const GRAY_300: Color = Color::rgb(224, 224, 224);
    pub const GRAY_400: Color = Color::rgb(189, 189, 189);
    pub const GRAY_500: Color = Color::rgb(158, 158, 158);
    pub const GRAY_600: Color = Color::rgb(117, 117, 117);
    pub const GRAY_700: Color = Color::rgb(97, 97, 97);
    pub const GRAY_800: Color = Color::rgb(66, 66, 66);
    pub const DARK_GRAY: Color = Color::rgb(33, 33, 33);
    pub const DARKER_GRAY: Color = Color::rgb(18, 18, 18);
    pub const DARKEST_GRAY: Color = Color::rgb(10, 10, 10);
    pub const BLACK: Color = Color::rgb(2, 2, 2);

    pub const RED: Color = Color::rgb(244, 67, 54);
    pub const GREEN: Color = Color::rgb(76, 175, 80);
    pub const BLUE: Color = Color::rgb(33, 150, 243);

    pub const YELLOW: Color = Color::rgb(255, 235, 59);
    pub const CYAN: Color = Color::rgb(0, 188, 212);
    pub const MAGENTA: Color = Color::rgb(233, 30, 99);

    pub const DARK_RED: Color = Color::rgb(183, 28, 28);
    pub const DARK_GREEN: Color = Color::rgb(27, 94, 32);
    pub const DARK_BLUE: Color = Color::rgb(13, 71, 161);
    pub const DARKER_RED: Color = Color::rgb(92, 6, 16);

    pub const LIGHT_RED: Color = Color::rgb(239, 154, 154);
    pub const LIGHT_GREEN: Color = Color::rgb(165, 214, 167);
    pub const LIGHT_BLUE: Color = Color::rgb(144, 202, 249);
    pub const LIGHTER_BLUE: Color = Color::rgb(187, 222, 251);

    pub const ORANGE: Color = Color::rgb(255, 152, 0);
    pub const PURPLE: Color = Color::rgb(156, 39, 176);
    pub const PINK: Color = Color::rgb(236, 64, 122);
    pub const BROWN: Color = Color::rgb(121, 85, 72);
    pub const TEAL: Color = Color::rgb(0, 150, 136);
}

impl Default for Color {
    /// Opaque black.
    fn default() -> Self {
        Color(0xFF00_0000)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> u32 {
        color.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_pack_as_argb() {
        let color = Color::argb(0x80, 0x12, 0x34, 0x56);
        assert_eq!(color.value(), 0x8012_3456);
        assert_eq!(
            (color.alpha(), color.red(), color.green(), color.blue()),
            (0x80, 0x12, 0x34, 0x56)
        );
        assert_eq!(color.value().to_le_bytes(), [0x56, 0x34, 0x12, 0x80]);
    }

    #[test]
    fn hex_colors_are_opaque() {
        assert_eq!(Color::from_hex(0x2196F3), Color::BLUE);
        assert_eq!(Color::from_hex(0xAB12_3456).value(), 0xFF12_3456);
        assert_eq!(Color::rgb(1, 2, 3).alpha(), 0xFF);
    }

    #[test]
    fn default_is_opaque_black() {
        assert_eq!(u32::from(Color::default()), 0xFF00_0000);
        assert_eq!(Color::from_argb(0xFF00_0000), Color::default());
    }
}
