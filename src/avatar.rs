use egui::Color32;

const SATURATION: f32 = 0.70;
const LIGHTNESS: f32 = 0.60;

/// Hue in degrees for a name with no cached image.
///
/// First UTF-16 code unit plus 37 per UTF-16 unit of length, on the untrimmed
/// name. An empty name maps to hue 0.
pub fn hue_for(name: &str) -> u32 {
    let mut units = name.encode_utf16();
    let Some(first) = units.next() else {
        return 0;
    };
    let length = 1 + units.count() as u32;
    (first as u32 + length * 37) % 360
}

pub fn color_for(name: &str) -> Color32 {
    let [r, g, b] = hsl_to_rgb(hue_for(name) as f32, SATURATION, LIGHTNESS);
    Color32::from_rgb(r, g, b)
}

/// "Blue Potion" -> "BP", "carrot" -> "CA", "X" -> "X".
pub fn initials(name: &str) -> String {
    let trimmed = name.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() > 1 {
        words
            .iter()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    } else {
        trimmed.chars().take(2).flat_map(char::to_uppercase).collect()
    }
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = (hue % 360.0) / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(r), channel(g), channel(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_names_use_first_letters() {
        assert_eq!(initials("Blue Potion"), "BP");
        assert_eq!(initials("  common   summer egg "), "CSE");
        assert_eq!(initials("Pet Shard Tranquil"), "PST");
    }

    #[test]
    fn single_word_uses_first_two_characters() {
        assert_eq!(initials("carrot"), "CA");
        assert_eq!(initials("  Koi  "), "KO");
        assert_eq!(initials("X"), "X");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn hue_follows_char_code_and_length() {
        // 'A' = 65, 5 * 37 = 185
        assert_eq!(hue_for("Apple"), 250);
        // 'D' = 68, 12 * 37 = 444 -> 512 % 360
        assert_eq!(hue_for("Dragon Fruit"), 152);
        assert_eq!(hue_for(""), 0);
    }

    #[test]
    fn hue_uses_untrimmed_name() {
        assert_ne!(hue_for(" Koi"), hue_for("Koi"));
    }

    #[test]
    fn same_name_same_color() {
        assert_eq!(color_for("Ember Lily"), color_for("Ember Lily"));
    }

    #[test]
    fn converts_primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), [255, 255, 255]);
    }
}
