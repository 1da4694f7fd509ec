//! Deterministic vector avatars.
//!
//! Every byte used below comes from the SHA-256 digest of the seed, so the
//! same name always renders the same face.

use sha2::{Digest, Sha256};

const SVG_PREFIX: &str = "<svg";
const FALLBACK_SEED: &str = "profile";

const BACKGROUNDS: &[&str] = &[
    "#f4a261", "#e76f51", "#2a9d8f", "#264653", "#e9c46a", "#8ecae6", "#b5838d", "#90be6d",
];
const SKIN_TONES: &[&str] = &["#ffdbac", "#f1c27d", "#e0ac69", "#c68642", "#8d5524"];

/// True when `avatar` holds inline SVG markup we can serve as is.
pub fn is_valid_avatar(avatar: &str) -> bool {
    avatar.trim_start().starts_with(SVG_PREFIX)
}

/// Returns `avatar` when it is usable, otherwise a generated one seeded by
/// `name`.
pub fn resolve_avatar(avatar: Option<&str>, name: &str) -> String {
    match avatar {
        Some(avatar) if is_valid_avatar(avatar) => avatar.trim().to_string(),
        _ => generate_avatar(name),
    }
}

pub fn generate_avatar(seed: &str) -> String {
    let seed = seed.trim();
    let seed = if seed.is_empty() { FALLBACK_SEED } else { seed };
    let digest = Sha256::digest(seed.as_bytes());

    let background = BACKGROUNDS[digest[0] as usize % BACKGROUNDS.len()];
    let skin = SKIN_TONES[digest[1] as usize % SKIN_TONES.len()];
    let eye_gap = 10 + (digest[2] % 8) as u32;
    let eye_y = 40 + (digest[3] % 6) as u32;
    let mouth_width = 12 + (digest[4] % 14) as u32;
    let mouth_curve = 56 + (digest[5] % 10) as u32;
    let hair_color = format!("#{:02x}{:02x}{:02x}", digest[6] / 2, digest[7] / 2, digest[8] / 2);

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" width="100" height="100">"#,
            r#"<rect width="100" height="100" fill="{bg}"/>"#,
            r#"<circle cx="50" cy="52" r="30" fill="{skin}"/>"#,
            r#"<path d="M20 45 Q50 {hair_top} 80 45 L80 38 Q50 10 20 38 Z" fill="{hair}"/>"#,
            r##"<circle cx="{left_eye}" cy="{eye_y}" r="3" fill="#222"/>"##,
            r##"<circle cx="{right_eye}" cy="{eye_y}" r="3" fill="#222"/>"##,
            r##"<path d="M{mouth_left} 60 Q50 {mouth_curve} {mouth_right} 60" stroke="#222" stroke-width="2" fill="none"/>"##,
            "</svg>"
        ),
        bg = background,
        skin = skin,
        hair = hair_color,
        hair_top = 18 + (digest[9] % 12) as u32,
        left_eye = 50 - eye_gap,
        right_eye = 50 + eye_gap,
        eye_y = eye_y,
        mouth_left = 50 - mouth_width / 2,
        mouth_right = 50 + mouth_width / 2,
        mouth_curve = mouth_curve,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate_avatar("Mili"), generate_avatar("Mili"));
        assert_ne!(generate_avatar("Mili"), generate_avatar("Peque"));
        assert!(is_valid_avatar(&generate_avatar("Mili")));
    }

    #[test]
    fn empty_seed_falls_back() {
        assert_eq!(generate_avatar(""), generate_avatar("profile"));
        assert_eq!(generate_avatar("   "), generate_avatar("profile"));
    }

    #[test]
    fn keeps_only_svg_markup() {
        let custom = "  <svg><circle r=\"1\"/></svg>";
        assert_eq!(resolve_avatar(Some(custom), "Ana"), custom.trim());
        assert_eq!(
            resolve_avatar(Some("https://example.com/me.png"), "Ana"),
            generate_avatar("Ana")
        );
        assert_eq!(resolve_avatar(Some(""), "Ana"), generate_avatar("Ana"));
        assert_eq!(resolve_avatar(None, ""), generate_avatar("profile"));
    }
}
