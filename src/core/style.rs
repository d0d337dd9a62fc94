use image::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hatch {
    /// 規則排列的小圓點
    Dots,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub fill: Color,
    pub edge: Color,
    pub line_width: f32,
    pub hatch: Option<Hatch>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingStyle {
    pub palette: [Color; 3],
    pub edge: Color,
    pub line_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePreset {
    pub name: &'static str,
    pub background: LayerStyle,
    pub perimeter: LayerStyle,
    pub water: LayerStyle,
    pub green: LayerStyle,
    pub forest: LayerStyle,
    pub building: BuildingStyle,
}

const INK: Color = Color::hex(0x2F3737);

const fn filled(fill: u32, line_width: f32) -> LayerStyle {
    LayerStyle {
        fill: Color::hex(fill),
        edge: INK,
        line_width,
        hatch: None,
    }
}

const fn hatched(fill: u32, edge: u32) -> LayerStyle {
    LayerStyle {
        fill: Color::hex(fill),
        edge: Color::hex(edge),
        line_width: 0.0,
        hatch: Some(Hatch::Dots),
    }
}

pub static MINIMALIST: StylePreset = StylePreset {
    name: "minimalist",
    background: hatched(0xF2F4F5, 0xDADBC1),
    perimeter: LayerStyle {
        fill: Color::hex(0xF2F4F5),
        edge: Color::hex(0x000000),
        line_width: 5.0,
        hatch: None,
    },
    water: hatched(0xA1E3FF, 0x2F3737),
    green: filled(0xD0F1BF, 1.0),
    forest: filled(0x64B96A, 1.0),
    building: BuildingStyle {
        palette: [
            Color::hex(0xFFC857),
            Color::hex(0xE9724C),
            Color::hex(0xC5283D),
        ],
        edge: INK,
        line_width: 0.5,
    },
};

pub static VINTAGE: StylePreset = StylePreset {
    name: "vintage",
    background: hatched(0xF8F6E9, 0x2F3737),
    perimeter: LayerStyle {
        fill: Color::hex(0xF8F6E9),
        edge: INK,
        line_width: 4.0,
        hatch: None,
    },
    water: hatched(0xB6D9DE, 0x2F3737),
    green: filled(0x8AAB92, 1.0),
    forest: filled(0x64855E, 1.0),
    building: BuildingStyle {
        palette: [
            Color::hex(0xC8AE9B),
            Color::hex(0x9A8978),
            Color::hex(0x7C6A58),
        ],
        edge: INK,
        line_width: 0.5,
    },
};

pub static COLORFUL: StylePreset = StylePreset {
    name: "colorful",
    background: hatched(0xF9E79F, 0x2F3737),
    perimeter: LayerStyle {
        fill: Color::hex(0xF9E79F),
        edge: INK,
        line_width: 4.0,
        hatch: None,
    },
    water: hatched(0x5DADE2, 0x2F3737),
    green: filled(0xABEBC6, 1.0),
    forest: filled(0x27AE60, 1.0),
    building: BuildingStyle {
        palette: [
            Color::hex(0xE74C3C),
            Color::hex(0x8E44AD),
            Color::hex(0x3498DB),
        ],
        edge: INK,
        line_width: 0.5,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStyle {
    #[default]
    Minimalist,
    Vintage,
    Colorful,
}

impl MapStyle {
    pub const ALL: [MapStyle; 3] = [MapStyle::Minimalist, MapStyle::Vintage, MapStyle::Colorful];

    /// 不認得的名稱一律退回 minimalist
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "vintage" => MapStyle::Vintage,
            "colorful" => MapStyle::Colorful,
            "minimalist" => MapStyle::Minimalist,
            other => {
                if !other.is_empty() {
                    tracing::debug!("Unknown style '{}', using minimalist", other);
                }
                MapStyle::Minimalist
            }
        }
    }

    pub fn name(self) -> &'static str {
        self.preset().name
    }

    pub fn preset(self) -> &'static StylePreset {
        match self {
            MapStyle::Minimalist => &MINIMALIST,
            MapStyle::Vintage => &VINTAGE,
            MapStyle::Colorful => &COLORFUL,
        }
    }
}
