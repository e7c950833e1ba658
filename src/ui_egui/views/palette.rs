use egui::Color32;

pub(crate) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Parse `#RRGGBB` or `#RGB` into a color.
pub fn parse_color(hex: &str) -> Option<Color32> {
    let hex = hex.trim_start_matches('#');
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        6 => Some(Color32::from_rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let expand = |c: &str| channel(c).map(|v| v * 17);
            Some(Color32::from_rgb(
                expand(&hex[0..1])?,
                expand(&hex[1..2])?,
                expand(&hex[2..3])?,
            ))
        }
        _ => None,
    }
}

#[derive(Clone, Copy)]
pub(crate) struct TimelinePalette {
    pub background: Color32,
    pub hour_line: Color32,
    pub quarter_line: Color32,
    pub column_border: Color32,
    pub label: Color32,
    pub block_text: Color32,
    pub create_fill: Color32,
    pub create_border: Color32,
    pub overflow_text: Color32,
    pub today_bg: Color32,
}

impl TimelinePalette {
    pub fn from_visuals(visuals: &egui::Visuals) -> Self {
        if visuals.dark_mode {
            Self {
                background: Color32::from_gray(28),
                hour_line: Color32::from_gray(70),
                quarter_line: Color32::from_gray(42),
                column_border: Color32::from_gray(60),
                label: Color32::from_gray(170),
                block_text: Color32::WHITE,
                create_fill: with_alpha(Color32::from_rgb(90, 160, 255), 90),
                create_border: Color32::from_rgb(90, 160, 255),
                overflow_text: Color32::from_gray(190),
                today_bg: Color32::from_rgb(34, 42, 58),
            }
        } else {
            Self {
                background: Color32::WHITE,
                hour_line: Color32::from_gray(210),
                quarter_line: Color32::from_gray(238),
                column_border: Color32::from_gray(200),
                label: Color32::from_gray(90),
                block_text: Color32::WHITE,
                create_fill: with_alpha(Color32::from_rgb(30, 110, 230), 70),
                create_border: Color32::from_rgb(30, 110, 230),
                overflow_text: Color32::from_gray(80),
                today_bg: Color32::from_rgb(235, 243, 255),
            }
        }
    }

    /// Block fill for an occurrence color, falling back to a neutral blue.
    pub fn block_fill(&self, color: &str) -> Color32 {
        parse_color(color).unwrap_or(Color32::from_rgb(74, 144, 217))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_with_hash() {
        assert_eq!(parse_color("#FF5500"), Some(Color32::from_rgb(255, 85, 0)));
    }

    #[test]
    fn test_parse_short_color() {
        assert_eq!(parse_color("#0F0"), Some(Color32::from_rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_color_invalid() {
        assert!(parse_color("").is_none());
        assert!(parse_color("FF55").is_none());
        assert!(parse_color("GGGGGG").is_none());
    }
}
