//! Technology icons for the about page
//!
//! Icons come from a fixed table keyed by a normalized technology name.
//! Unknown names resolve to nothing.

/// A known technology icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    /// Display name
    pub title: &'static str,
    /// Brand color, hex without `#`
    pub hex: &'static str,
}

const ICONS: &[(&str, Icon)] = &[
    ("javascript", Icon { title: "JavaScript", hex: "F7DF1E" }),
    ("typescript", Icon { title: "TypeScript", hex: "3178C6" }),
    ("react", Icon { title: "React", hex: "61DAFB" }),
    ("angular", Icon { title: "Angular", hex: "DD0031" }),
    ("nodejs", Icon { title: "Node.js", hex: "339933" }),
    ("nx", Icon { title: "Nx", hex: "143055" }),
    ("npm", Icon { title: "npm", hex: "CB3837" }),
    ("yarn", Icon { title: "Yarn", hex: "2C8EBF" }),
    ("git", Icon { title: "Git", hex: "F05032" }),
    ("html5", Icon { title: "HTML5", hex: "E34F26" }),
    ("css3", Icon { title: "CSS3", hex: "1572B6" }),
    ("sass", Icon { title: "Sass", hex: "CC6699" }),
    ("redux", Icon { title: "Redux", hex: "764ABC" }),
    ("webpack", Icon { title: "webpack", hex: "8DD6F9" }),
    ("ionic", Icon { title: "Ionic", hex: "3880FF" }),
    ("java", Icon { title: "Java", hex: "007396" }),
    ("android", Icon { title: "Android", hex: "3DDC84" }),
    ("linux", Icon { title: "Linux", hex: "FCC624" }),
    ("eslint", Icon { title: "ESLint", hex: "4B32C3" }),
    ("prettier", Icon { title: "Prettier", hex: "F7B93E" }),
    ("visualstudiocode", Icon { title: "Visual Studio Code", hex: "007ACC" }),
];

/// Normalize a technology name into a table key: `Node.js` -> `nodejs`
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Look up the icon of a technology
pub fn lookup(name: &str) -> Option<&'static Icon> {
    let key = normalize(name);
    ICONS.iter().find(|(k, _)| *k == key).map(|(_, icon)| icon)
}

/// Render the icon of a technology as an inline SVG badge
///
/// Returns `None` for unknown technologies so callers render nothing.
pub fn render(name: &str) -> Option<String> {
    match lookup(name) {
        Some(icon) => Some(icon.to_svg()),
        None => {
            tracing::warn!("No icon for {:?}", name);
            None
        }
    }
}

impl Icon {
    /// Initials shown inside the badge
    fn initials(&self) -> String {
        self.title
            .split(|c: char| c.is_whitespace() || c == '.')
            .filter_map(|word| word.chars().next())
            .filter(char::is_ascii_alphanumeric)
            .take(2)
            .collect()
    }

    /// Whether dark text reads better on the brand color
    fn is_light(&self) -> bool {
        let channel = |i: usize| u32::from_str_radix(&self.hex[i..i + 2], 16).unwrap_or(0);
        // ITU-R BT.601 luma
        let luma = 299 * channel(0) + 587 * channel(2) + 114 * channel(4);
        luma > 150_000
    }

    /// Render as an SVG badge
    pub fn to_svg(&self) -> String {
        let text_fill = if self.is_light() { "#111" } else { "#fff" };
        format!(
            r##"<svg role="img" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg" fill="#{hex}"><title>{title}</title><rect width="24" height="24" rx="5"/><text x="12" y="16" font-size="10" font-family="sans-serif" text-anchor="middle" fill="{text_fill}">{initials}</text></svg>"##,
            hex = self.hex,
            title = self.title,
            text_fill = text_fill,
            initials = self.initials(),
        )
    }
}
