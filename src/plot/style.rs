use plotters::style::RGBColor;

/// Immutable rendering configuration passed explicitly to the renderers
/// instead of living in process-wide style state.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub single_size: (u32, u32),
    pub multi_size: (u32, u32),
    pub experiment: String,
    pub annotation: String,
    pub lumi_text: String,
    pub x_label: String,
    pub y_label_single: String,
    pub y_label_multi: String,
    pub y_range_single: (f64, f64),
    pub band_1sigma: RGBColor,
    pub band_2sigma: RGBColor,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            single_size: (600, 600),
            multi_size: (1000, 800),
            experiment: "CMS".to_string(),
            annotation: "Internal".to_string(),
            lumi_text: "63 fb⁻¹ (2022+2023) (13.6 TeV)".to_string(),
            x_label: "CTau [m]".to_string(),
            y_label_single: "95% CL upper limit on BR(H→SS)".to_string(),
            y_label_multi: "95% CL upper limit on BR(H→XX, X→bb)".to_string(),
            y_range_single: (5e-4, 1.0),
            band_1sigma: RGBColor(50, 205, 50), // limegreen
            band_2sigma: RGBColor(255, 215, 0), // gold
        }
    }
}
