use serde::{Deserialize, Serialize};

/// Document styling configuration for the PDF renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStyles {
    /// Title font size in points.
    pub title_size: f64,

    /// Section heading font size in points.
    pub heading_size: f64,

    /// Body/table text font size in points.
    pub body_size: f64,

    /// Page margin in millimeters (applied uniformly).
    pub margin_mm: f64,
}

impl Default for DocumentStyles {
    fn default() -> Self {
        Self {
            title_size: 20.0,
            heading_size: 13.0,
            body_size: 9.0,
            margin_mm: 15.0,
        }
    }
}
