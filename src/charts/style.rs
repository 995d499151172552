//! Chart Style Module
//! Panel identities, palettes and the ICV colour and radius scales shared
//! by the interactive plots and the static exports.

/// Backend-neutral RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgb(self.0, self.1, self.2)
    }

    pub fn to_plotters(self) -> plotters::style::RGBColor {
        plotters::style::RGBColor(self.0, self.1, self.2)
    }

    /// Linear RGB interpolation, `t` in 0..=1.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Delinquency buckets, in ordinal order (Nord palette).
pub const BUCKET_PALETTE: [Rgb; 5] = [
    Rgb(0x4C, 0x56, 0x6A),
    Rgb(0x5E, 0x81, 0xAC),
    Rgb(0x88, 0xC0, 0xD0),
    Rgb(0xA3, 0xBE, 0x8C),
    Rgb(0xBF, 0x61, 0x6A),
];

pub const GOOD_COLOR: Rgb = Rgb(0xA3, 0xBE, 0x8C);
pub const BAD_COLOR: Rgb = Rgb(255, 192, 203); // Pink

/// d3 Category10, used for risk levels.
pub const CATEGORY10: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

pub const TIMELINE_LINE: Rgb = Rgb(70, 130, 180); // Steelblue
pub const GUIDE_LINE: Rgb = Rgb(128, 128, 128);

const ICV_GREEN: Rgb = Rgb(0, 128, 0);
const ICV_ORANGE: Rgb = Rgb(255, 165, 0);
const ICV_RED: Rgb = Rgb(255, 0, 0);

/// Smallest and largest timeline marker radius.
pub const MIN_RADIUS: f64 = 1.0;
pub const MAX_RADIUS: f64 = 6.0;

/// The four dashboard panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    BucketShare,
    Deterioration,
    IcvByRisk,
    IcvTimeline,
}

impl PanelId {
    pub const ALL: [PanelId; 4] = [
        PanelId::BucketShare,
        PanelId::Deterioration,
        PanelId::IcvByRisk,
        PanelId::IcvTimeline,
    ];

    /// Stable identifier, also used as export file stem.
    pub fn key(&self) -> &'static str {
        match self {
            PanelId::BucketShare => "dist_altura_mora",
            PanelId::Deterioration => "pct_deterioro_mora",
            PanelId::IcvByRisk => "icv_evolucion",
            PanelId::IcvTimeline => "ev_icv_depto_tcredito",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PanelId::BucketShare => "Distribución de Altura de Mora por Mes (%)",
            PanelId::Deterioration => "Porcentaje de deterioro por Altura de Mora",
            PanelId::IcvByRisk => "Evolución ICV Mensual por Nivel de Riesgo",
            PanelId::IcvTimeline => "Evolución del ICV por Departamento y Tipo de Crédito",
        }
    }
}

/// Axis slot of the `index`-th of `count` categories. Value axes grow
/// upward, so a horizontal bar chart flips the order to list its first
/// category at the top.
pub fn category_slot(index: usize, count: usize, horizontal: bool) -> usize {
    if horizontal {
        count.saturating_sub(index + 1)
    } else {
        index
    }
}

/// Category labels indexed by axis slot.
pub fn slot_labels(mut labels: Vec<String>, horizontal: bool) -> Vec<String> {
    if horizontal {
        labels.reverse();
    }
    labels
}

pub fn bucket_color(index: usize) -> Rgb {
    BUCKET_PALETTE[index % BUCKET_PALETTE.len()]
}

pub fn risk_color(index: usize) -> Rgb {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Good/bad colours; unknown indicators fall back to Category10.
pub fn standing_color(standing: &str, index: usize) -> Rgb {
    match standing {
        "Buenos" => GOOD_COLOR,
        "Malos" => BAD_COLOR,
        _ => risk_color(index),
    }
}

/// Green at 0%, orange at 50%, red at 100% ICV.
pub fn icv_color(icv: f64) -> Rgb {
    if icv <= 50.0 {
        ICV_GREEN.lerp(ICV_ORANGE, icv / 50.0)
    } else {
        ICV_ORANGE.lerp(ICV_RED, (icv - 50.0) / 50.0)
    }
}

/// Marker radius scaled linearly from 1 at ICV 0 to 6 at `max_icv`.
pub fn icv_radius(icv: f64, max_icv: f64) -> f64 {
    if max_icv <= 0.0 {
        return MIN_RADIUS;
    }
    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * (icv / max_icv)
}
