//! Text helpers for the PDF surface: WinAnsi folding, Helvetica metrics,
//! word wrapping and French date formatting.
use chrono::{Datelike, NaiveDateTime, Timelike};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;
/// Line height factor applied to the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Restricts `text` to the WinAnsi repertoire of the base-14 fonts.
///
/// `€`, Latin-1 letters, `œ` and typographic quotes are kept. Other
/// characters lose their accents through compatibility decomposition, or
/// become `?` when nothing drawable is left. Non-breaking spaces become
/// plain spaces.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push('\n'),
            '\u{00a0}' | '\u{202f}' | '\u{2007}' => out.push(' '),
            c if c.is_control() => out.push(' '),
            c if helvetica_width(c).is_some() => out.push(c),
            c => {
                let before = out.len();
                out.extend(
                    c.nfkd()
                        .filter(|d| !is_combining_mark(*d) && !d.is_control())
                        .filter(|d| helvetica_width(*d).is_some()),
                );
                if out.len() == before {
                    out.push('?');
                }
            }
        }
    }
    out
}

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica widths for U+00A0..=U+00FF.
const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // A0..AF
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // B0..BF
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // C0..CF
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // D0..DF
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // E0..EF
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // F0..FF
];

/// Width of `ch` when it has a WinAnsi code, `None` otherwise.
fn helvetica_width(ch: char) -> Option<u16> {
    let code = ch as u32;
    match code {
        32..=126 => Some(HELVETICA_WIDTHS[(code - 32) as usize]),
        0xa0..=0xff => Some(LATIN1_WIDTHS[(code - 0xa0) as usize]),
        _ => match ch {
            '€' | 'ƒ' | '†' | '‡' | '–' => Some(556),
            '‚' | '‘' | '’' => Some(222),
            '„' | '“' | '”' | 'ˆ' | '˜' | '‹' | '›' => Some(333),
            '…' | '‰' | 'Œ' | '—' | '™' => Some(1000),
            'Š' | 'Ÿ' => Some(667),
            'Ž' => Some(611),
            '•' => Some(350),
            'š' | 'ž' => Some(500),
            'œ' => Some(944),
            _ => None,
        },
    }
}

fn glyph_width(ch: char) -> u16 {
    helvetica_width(ch).unwrap_or(556)
}

/// Rendered width of already folded text, in millimetres.
pub fn text_width(text: &str, size_pt: f32, weight: Weight) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(glyph_width(ch))).sum();
    let bold = match weight {
        Weight::Regular => 1.0,
        Weight::Bold => 1.05,
    };
    units as f32 / 1000.0 * size_pt * MM_PER_PT * bold
}

/// Baseline-to-baseline distance for a font size, in millimetres.
pub fn line_height(size_pt: f32) -> f32 {
    size_pt * LINE_HEIGHT_FACTOR * MM_PER_PT
}

/// Greedy word wrap of folded text into lines no wider than `max_width`.
///
/// Explicit newlines are kept; a word longer than the line is cut.
pub fn wrap(text: &str, max_width: f32, size_pt: f32, weight: Weight) -> Vec<String> {
    let fits = |candidate: &str| text_width(candidate, size_pt, weight) <= max_width;
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut piece = String::new();
            for ch in word.chars() {
                piece.push(ch);
                if !fits(&piece) && piece.chars().count() > 1 {
                    piece.pop();
                    lines.push(std::mem::take(&mut piece));
                    piece.push(ch);
                }
            }
            current = piece;
        }
        lines.push(current);
    }
    lines
}

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// `17 octobre 2026 à 14:30`.
pub fn format_datetime_fr(at: NaiveDateTime) -> String {
    let month = MONTHS[at.month0() as usize];
    format!(
        "{} {month} {} à {:02}:{:02}",
        at.day(),
        at.year(),
        at.hour(),
        at.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keeps_win_ansi_text() {
        assert_eq!(pdf_safe("Détail des charges"), "Détail des charges");
        assert_eq!(pdf_safe("manœuvre, Énergie"), "manœuvre, Énergie");
        assert_eq!(pdf_safe("1\u{202f}234,56\u{a0}€"), "1 234,56 €");
        assert_eq!(pdf_safe("d’endettement « net »"), "d’endettement « net »");
    }

    #[test]
    fn folds_what_win_ansi_lacks() {
        assert_eq!(pdf_safe("Łódź"), "?ódz");
        assert_eq!(pdf_safe("ﬁxe"), "fixe");
        assert_eq!(pdf_safe("→"), "?");
        assert_eq!(pdf_safe("a\tb\nc"), "a b\nc");
    }

    #[test]
    fn widths_follow_helvetica_metrics() {
        // 'W' is 944 units, 'i' is 222.
        let w = text_width("W", 10.0, Weight::Regular);
        let i = text_width("i", 10.0, Weight::Regular);
        assert!((w - 0.944 * 10.0 * MM_PER_PT).abs() < 1e-4);
        assert!(w > i * 4.0);
        assert!(text_width("abc", 10.0, Weight::Bold) > text_width("abc", 10.0, Weight::Regular));
    }

    #[test]
    fn accented_glyphs_have_their_own_widths() {
        let size = 10.0;
        assert_eq!(text_width("é", size, Weight::Regular), text_width("e", size, Weight::Regular));
        assert_eq!(text_width("€", size, Weight::Regular), text_width("0", size, Weight::Regular));
        let oe = text_width("œ", size, Weight::Regular);
        assert!((oe - 0.944 * size * MM_PER_PT).abs() < 1e-4);
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let text = "Votre budget est equilibre. Vos charges restent maitrisees.\nFin";
        let lines = wrap(text, 40.0, 9.0, Weight::Regular);
        assert!(lines.len() >= 3);
        assert_eq!(lines.last().map(String::as_str), Some("Fin"));
        for line in &lines {
            assert!(text_width(line, 9.0, Weight::Regular) <= 40.0);
        }
    }

    #[test]
    fn wrap_cuts_overlong_words() {
        let lines = wrap(&"x".repeat(200), 20.0, 9.0, Weight::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 200);
    }

    #[test]
    fn formats_french_timestamp() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(format_datetime_fr(at), "17 octobre 2026 à 14:05");
    }
}
