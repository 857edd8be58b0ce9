//! Paint and color conversion
//!
//! Shared by the fill, stroke, effect and text extractors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ExtractError;

/// RGBA color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Rgba {
    fn channels(&self) -> (u8, u8, u8) {
        (channel(self.r), channel(self.g), channel(self.b))
    }

    /// Paint opacity multiplied by the color's own alpha, rounded to two places
    pub fn combined_opacity(&self, opacity: f64) -> f64 {
        round_to((opacity * self.a).clamp(0.0, 1.0), 2)
    }

    pub fn hex(&self) -> String {
        let (r, g, b) = self.channels();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }

    /// CSS `rgba(r, g, b, a)` string
    pub fn css_rgba(&self, opacity: f64) -> String {
        let (r, g, b) = self.channels();
        format!("rgba({}, {}, {}, {})", r, g, b, self.combined_opacity(opacity))
    }

    pub fn to_color_value(&self, opacity: f64) -> ColorValue {
        ColorValue {
            hex: self.hex(),
            opacity: self.combined_opacity(opacity),
        }
    }
}

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorValue {
    pub hex: String,
    pub opacity: f64,
}

/// Raw paint as sent by the design API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_alpha")]
    pub opacity: f64,
    pub color: Option<Rgba>,
    pub image_ref: Option<String>,
    pub scale_mode: Option<String>,
    pub gradient_handle_positions: Option<Value>,
    #[serde(default)]
    pub gradient_stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgba,
}

/// Simplified paint: a CSS color string or a descriptor object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SimplifiedPaint {
    Color(String),
    Image(ImagePaint),
    Gradient(GradientPaint),
    Other(OtherPaint),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePaint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientPaint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_handle_positions: Option<Value>,
    pub gradient_stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: ColorValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherPaint {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Paint {
    pub fn simplify(&self) -> Result<SimplifiedPaint, ExtractError> {
        match self.kind.as_str() {
            "SOLID" => {
                let color = self.color.ok_or(ExtractError::MissingColor)?;
                if color.combined_opacity(self.opacity) == 1.0 {
                    Ok(SimplifiedPaint::Color(color.hex()))
                } else {
                    Ok(SimplifiedPaint::Color(color.css_rgba(self.opacity)))
                }
            }
            "IMAGE" => Ok(SimplifiedPaint::Image(ImagePaint {
                kind: self.kind.clone(),
                image_ref: self.image_ref.clone(),
                scale_mode: self.scale_mode.clone(),
            })),
            kind if kind.starts_with("GRADIENT_") => Ok(SimplifiedPaint::Gradient(GradientPaint {
                kind: self.kind.clone(),
                gradient_handle_positions: self.gradient_handle_positions.clone(),
                gradient_stops: self
                    .gradient_stops
                    .iter()
                    .map(|stop| GradientStop {
                        position: stop.position,
                        color: stop.color.to_color_value(self.opacity),
                    })
                    .collect(),
            })),
            _ => Ok(SimplifiedPaint::Other(OtherPaint {
                kind: self.kind.clone(),
            })),
        }
    }
}

/// Simplify every visible paint in a list
pub fn simplify_paints(paints: &[Paint]) -> Result<Vec<SimplifiedPaint>, ExtractError> {
    paints
        .iter()
        .filter(|p| p.visible)
        .map(Paint::simplify)
        .collect()
}

/// CSS box shorthand (`top right bottom left`) in px.
///
/// Returns `None` when `ignore_zero` is set and every side is zero.
pub fn css_shorthand(top: f64, right: f64, bottom: f64, left: f64, ignore_zero: bool) -> Option<String> {
    if ignore_zero && top == 0.0 && right == 0.0 && bottom == 0.0 && left == 0.0 {
        return None;
    }

    let shorthand = if top == right && right == bottom && bottom == left {
        format!("{}px", top)
    } else if top == bottom && right == left {
        format!("{}px {}px", top, right)
    } else if right == left {
        format!("{}px {}px {}px", top, right, bottom)
    } else {
        format!("{}px {}px {}px {}px", top, right, bottom, left)
    };
    Some(shorthand)
}
