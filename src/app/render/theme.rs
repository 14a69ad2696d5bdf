use eframe::egui::{self, Color32};
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    DarkBlack,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::DarkBlack];

    /// Header toggle: light goes to dark, both dark variants go to light.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark | Self::DarkBlack => Self::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::DarkBlack => "Dark (black)",
        }
    }

    pub fn is_dark(self) -> bool {
        !matches!(self, Self::Light)
    }

    pub fn visuals(self) -> egui::Visuals {
        let palette = self.palette();
        let mut visuals = if self.is_dark() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = palette.panel;
        visuals.window_fill = palette.panel;
        visuals.extreme_bg_color = palette.background;
        visuals
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                background: Color32::from_rgb(0xf8, 0xf9, 0xfa),
                panel: Color32::from_rgb(0xff, 0xff, 0xff),
                grid: Color32::from_rgba_unmultiplied(173, 181, 189, 60),
                link: Color32::from_rgb(0xad, 0xb5, 0xbd),
                structural_link: Color32::from_rgb(0x49, 0x50, 0x57),
                outline: Color32::from_rgba_unmultiplied(255, 255, 255, 220),
                label_background: Color32::from_rgb(0xff, 0xff, 0xff),
                label_text: Color32::from_rgb(0x21, 0x25, 0x29),
                muted_text: Color32::from_rgb(0x86, 0x8e, 0x96),
                selected: Color32::from_rgb(0xf0, 0x8c, 0x00),
                tag_highlight: Color32::from_rgb(0xcc, 0x5d, 0xe8),
                gap: Color32::from_rgb(0xff, 0x6b, 0x6b),
                central: Color32::from_rgb(0x51, 0xcf, 0x66),
                wiki: Color32::from_rgb(0xff, 0xd4, 0x3b),
                first_level: Color32::from_rgb(0x4d, 0xab, 0xf7),
                second_level: Color32::from_rgb(0x74, 0xc0, 0xfc),
                other: Color32::from_rgb(0x33, 0x9a, 0xf0),
            },
            Self::Dark => Palette {
                background: Color32::from_rgb(19, 23, 29),
                panel: Color32::from_rgb(27, 31, 38),
                grid: Color32::from_rgba_unmultiplied(60, 70, 80, 70),
                link: Color32::from_rgb(0x5c, 0x66, 0x70),
                structural_link: Color32::from_rgb(0xad, 0xb5, 0xbd),
                outline: Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                label_background: Color32::from_rgb(33, 37, 41),
                label_text: Color32::from_gray(238),
                muted_text: Color32::from_gray(150),
                selected: Color32::from_rgb(245, 206, 93),
                tag_highlight: Color32::from_rgb(0xda, 0x77, 0xf2),
                gap: Color32::from_rgb(0xff, 0x87, 0x87),
                central: Color32::from_rgb(0x69, 0xdb, 0x7c),
                wiki: Color32::from_rgb(0xff, 0xe0, 0x66),
                first_level: Color32::from_rgb(0x74, 0xc0, 0xfc),
                second_level: Color32::from_rgb(0xa5, 0xd8, 0xff),
                other: Color32::from_rgb(0x4d, 0xab, 0xf7),
            },
            Self::DarkBlack => Palette {
                background: Color32::BLACK,
                panel: Color32::from_rgb(10, 10, 10),
                grid: Color32::from_rgba_unmultiplied(48, 48, 48, 70),
                link: Color32::from_rgb(0x49, 0x50, 0x57),
                structural_link: Color32::from_rgb(0xce, 0xd4, 0xda),
                outline: Color32::from_rgba_unmultiplied(0, 0, 0, 220),
                label_background: Color32::from_rgb(16, 16, 16),
                label_text: Color32::from_gray(245),
                muted_text: Color32::from_gray(140),
                selected: Color32::from_rgb(255, 212, 59),
                tag_highlight: Color32::from_rgb(0xe5, 0x99, 0xf7),
                gap: Color32::from_rgb(0xff, 0xa8, 0xa8),
                central: Color32::from_rgb(0x8c, 0xe9, 0x9a),
                wiki: Color32::from_rgb(0xff, 0xec, 0x99),
                first_level: Color32::from_rgb(0x74, 0xc0, 0xfc),
                second_level: Color32::from_rgb(0xd0, 0xeb, 0xff),
                other: Color32::from_rgb(0x74, 0xc0, 0xfc),
            },
        }
    }
}

/// Colors for one theme, one per rendering role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub panel: Color32,
    pub grid: Color32,
    pub link: Color32,
    pub structural_link: Color32,
    pub outline: Color32,
    pub label_background: Color32,
    pub label_text: Color32,
    pub muted_text: Color32,
    pub selected: Color32,
    pub tag_highlight: Color32,
    pub gap: Color32,
    pub central: Color32,
    pub wiki: Color32,
    pub first_level: Color32,
    pub second_level: Color32,
    pub other: Color32,
}
