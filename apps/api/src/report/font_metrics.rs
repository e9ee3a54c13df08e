//! Static font-metric tables for the PDF base-14 Helvetica faces.
//!
//! Widths are in em units (1/1000 of the AFM values). Reports only use the
//! built-in Helvetica family, so these tables are exact for printable ASCII.
//! Anything outside 0x20..=0x7E is measured with `average_char_width`.
//! Index = (char as usize) - 32.

use serde::Serialize;

/// Millimetres per typographic point.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Font styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FontStyle {
    Regular,
    Bold,
    /// Helvetica-Oblique shares the regular advance widths.
    Oblique,
}

pub struct FontMetricTable {
    widths: [f32; 95],
    pub average_char_width: f32,
}

impl FontMetricTable {
    pub fn for_style(style: FontStyle) -> &'static FontMetricTable {
        match style {
            FontStyle::Regular | FontStyle::Oblique => &HELVETICA_TABLE,
            FontStyle::Bold => &HELVETICA_BOLD_TABLE,
        }
    }

    /// Width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }
}

/// Rendered width of `s` in millimetres.
pub fn width_mm(s: &str, style: FontStyle, size_pt: f64) -> f64 {
    FontMetricTable::for_style(style).measure_str(s) as f64 * size_pt * PT_TO_MM
}

// ────────────────────────────────────────────────────────────────────────────
// Line wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap to `max_width_mm`. Explicit newlines force a break and
/// words wider than a whole line are split between characters.
pub fn wrap_lines(text: &str, style: FontStyle, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let space_w = width_mm(" ", style, size_pt);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0_f64;

        for word in paragraph.split_whitespace() {
            let word_w = width_mm(word, style, size_pt);

            if word_w > max_width_mm {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(word, style, size_pt, max_width_mm);
                current = pieces.pop().unwrap_or_default();
                current_w = width_mm(&current, style, size_pt);
                lines.extend(pieces);
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
            } else if current_w + space_w + word_w > max_width_mm {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_w = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            }
        }
        lines.push(current);
    }

    // Blank trailing paragraphs add no printed lines.
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_long_word(word: &str, style: FontStyle, size_pt: f64, max_width_mm: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(c);
        if !piece.is_empty() && width_mm(&candidate, style, size_pt) > max_width_mm {
            pieces.push(std::mem::replace(&mut piece, c.to_string()));
        } else {
            piece = candidate;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Shortens `s` with a trailing "..." so it fits in `max_width_mm`.
pub fn truncate_to_width(s: &str, style: FontStyle, size_pt: f64, max_width_mm: f64) -> String {
    if width_mm(s, style, size_pt) <= max_width_mm {
        return s.to_string();
    }
    let ellipsis_w = width_mm("...", style, size_pt);
    let mut out = String::new();
    for c in s.chars() {
        out.push(c);
        if width_mm(&out, style, size_pt) + ellipsis_w > max_width_mm {
            out.pop();
            break;
        }
    }
    out.push_str("...");
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.52,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.56,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_known_widths() {
        let t = FontMetricTable::for_style(FontStyle::Regular);
        assert!((t.measure_str("ab") - 1.112).abs() < 1e-6);
        // 10 x 'M' at 10pt = 8.33em * 10pt = 83.3pt
        let w = width_mm("MMMMMMMMMM", FontStyle::Regular, 10.0);
        assert!((w - 83.3 * PT_TO_MM).abs() < 1e-3);
    }

    #[test]
    fn test_bold_is_wider() {
        assert!(width_mm("finding", FontStyle::Bold, 9.0) > width_mm("finding", FontStyle::Regular, 9.0));
        assert_eq!(
            width_mm("finding", FontStyle::Oblique, 9.0),
            width_mm("finding", FontStyle::Regular, 9.0)
        );
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap_lines("odd shadow", FontStyle::Regular, 9.0, 140.0), vec!["odd shadow"]);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the reflection in the left window does not match the light source on the right side of the frame at all";
        let lines = wrap_lines(text, FontStyle::Regular, 9.0, 40.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(width_mm(line, FontStyle::Regular, 9.0) <= 40.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_explicit_newlines_break() {
        let lines = wrap_lines("one\ntwo", FontStyle::Regular, 9.0, 140.0);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "x".repeat(200);
        let lines = wrap_lines(&word, FontStyle::Regular, 9.0, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_empty_text_is_single_empty_line() {
        assert_eq!(wrap_lines("", FontStyle::Regular, 9.0, 100.0), vec![String::new()]);
    }

    #[test]
    fn test_truncate_to_width() {
        let url = format!("https://files.example/{}", "a".repeat(300));
        let short = truncate_to_width(&url, FontStyle::Regular, 7.0, 50.0);
        assert!(short.ends_with("..."));
        assert!(width_mm(&short, FontStyle::Regular, 7.0) <= 50.0);
        assert_eq!(truncate_to_width("ok", FontStyle::Regular, 7.0, 50.0), "ok");
    }
}
