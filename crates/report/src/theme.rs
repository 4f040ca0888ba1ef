/// 8-bit RGB color shared by the chart rasterizer and the PDF writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        )
    }
}

pub const ACCENT: Rgb = Rgb::hex(0xff6b47);
pub const TEXT_PRIMARY: Rgb = Rgb::hex(0x2c3e50);
pub const TEXT_SECONDARY: Rgb = Rgb::hex(0x5a6c7d);
pub const CARD_BG: Rgb = Rgb::hex(0xf8f9fa);
pub const WHITE: Rgb = Rgb::hex(0xffffff);
pub const GREEN: Rgb = Rgb::hex(0x2e7d32);
pub const RED: Rgb = Rgb::hex(0xc62828);
pub const ORANGE: Rgb = Rgb::hex(0xf39c12);
pub const BORDER: Rgb = Rgb::hex(0xdee2e6);
pub const AXIS: Rgb = Rgb::hex(0x9aa5b1);

pub const SUCCESS_BG: Rgb = Rgb(232, 245, 233);
pub const WARNING_BG: Rgb = Rgb(255, 243, 224);
pub const DANGER_BG: Rgb = Rgb(255, 235, 238);

/// Charges pie palette, cycled by slice index.
pub const CHARGES_PALETTE: [Rgb; 4] = [
    Rgb::hex(0xff6b47),
    Rgb::hex(0xff9800),
    Rgb::hex(0xe65100),
    Rgb::hex(0xc62828),
];

/// Revenue pie palette, cycled by slice index.
pub const REVENUS_PALETTE: [Rgb; 4] = [
    Rgb::hex(0x2e7d32),
    Rgb::hex(0x4caf50),
    Rgb::hex(0x66bb6a),
    Rgb::hex(0x81c784),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_splits_channels() {
        assert_eq!(Rgb::hex(0xff6b47), Rgb(255, 107, 71));
        assert_eq!(Rgb::hex(0x2c3e50), Rgb(44, 62, 80));
    }
}
