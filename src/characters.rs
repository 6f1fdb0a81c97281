// Character -> color variant registry, in vs-screen display order.
// Color names match the overlay asset folders (<Character>/<Color> <Side>.png).

pub const DEFAULT_COLOR: &str = "Default";

pub static CHARACTER_COLORS: &[(&str, &[&str])] = &[
    ("Bowser", &["Default", "Red", "Blue", "Black"]),
    ("Captain Falcon", &["Default", "Red", "Blue", "Green", "White", "Black"]),
    ("Donkey Kong", &["Default", "Red", "Blue", "Green", "Purple"]),
    ("Dr Mario", &["Default", "Red", "Blue", "Green", "Black"]),
    ("Falco", &["Default", "Red", "Blue", "Green"]),
    ("Fox", &["Default", "Red", "Blue", "Green"]),
    ("Ganondorf", &["Default", "Red", "Blue", "Green", "Purple"]),
    ("Ice Climbers", &["Default", "Red", "Green", "Orange"]),
    ("Jigglypuff", &["Default", "Red", "Blue", "Green", "Yellow"]),
    ("Kirby", &["Default", "Red", "Blue", "Green", "White", "Yellow"]),
    ("Link", &["Default", "Red", "Blue", "White", "Black"]),
    ("Luigi", &["Default", "Blue", "Pink", "White"]),
    ("Mario", &["Default", "Blue", "Brown", "Green", "Yellow"]),
    ("Marth", &["Default", "Red", "Blue", "Green", "White", "Black"]),
    ("Mewtwo", &["Default", "Blue", "Green", "Yellow"]),
    ("Mr Game & Watch", &["Default", "Red", "Blue", "Green"]),
    ("Ness", &["Default", "Blue", "Green", "Yellow"]),
    ("Peach", &["Default", "Blue", "Green", "White", "Yellow"]),
    ("Pichu", &["Default", "Red", "Blue", "Green"]),
    ("Pikachu", &["Default", "Red", "Blue", "Green"]),
    ("Roy", &["Default", "Red", "Blue", "Green", "Yellow"]),
    ("Samus", &["Default", "Brown", "Green", "Pink", "Purple"]),
    ("Sheik", &["Default", "Red", "Blue", "Green", "Purple"]),
    ("Yoshi", &["Default", "Red", "Blue", "Cyan", "Pink", "Yellow"]),
    ("Young Link", &["Default", "Red", "Blue", "White", "Black"]),
    ("Zelda", &["Default", "Red", "Blue", "Green", "Purple"]),
];

pub fn all_characters() -> Vec<&'static str> {
    CHARACTER_COLORS.iter().map(|(name, _)| *name).collect()
}

pub fn colors_for(character: &str) -> &'static [&'static str] {
    CHARACTER_COLORS
        .iter()
        .find(|(name, _)| *name == character)
        .map(|(_, colors)| *colors)
        .unwrap_or(&[])
}

pub fn default_color_for(character: &str) -> &'static str {
    let colors = colors_for(character);
    if colors.contains(&DEFAULT_COLOR) {
        DEFAULT_COLOR
    } else {
        colors.first().copied().unwrap_or("")
    }
}

pub fn is_known_character(character: &str) -> bool {
    CHARACTER_COLORS.iter().any(|(name, _)| *name == character)
}

pub fn is_legal_color(character: &str, color: &str) -> bool {
    colors_for(character).iter().any(|entry| *entry == color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_character_has_default_first() {
        for name in all_characters() {
            let colors = colors_for(name);
            assert!(!colors.is_empty(), "{name} has no colors");
            assert_eq!(colors[0], DEFAULT_COLOR, "{name} does not lead with Default");
        }
    }

    #[test]
    fn test_registry_order_is_stable() {
        let first = all_characters();
        let second = all_characters();
        assert_eq!(first, second);
        assert_eq!(first.len(), 26);
        assert_eq!(first[0], "Bowser");
        assert_eq!(first[first.len() - 1], "Zelda");
    }

    #[test]
    fn test_unknown_character_yields_empty() {
        assert!(colors_for("").is_empty());
        assert!(colors_for("Master Hand").is_empty());
        assert!(!is_known_character("Master Hand"));
        assert_eq!(default_color_for("Master Hand"), "");
    }

    #[test]
    fn test_color_lookups() {
        assert_eq!(colors_for("Fox"), &["Default", "Red", "Blue", "Green"]);
        assert_eq!(default_color_for("Marth"), "Default");
        assert!(is_legal_color("Sheik", "Purple"));
        assert!(!is_legal_color("Fox", "Purple"));
        assert!(!is_legal_color("", "Default"));
    }
}
