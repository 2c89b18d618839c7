//! 5x7 bitmap digits for marker labels.

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Blank columns between two glyphs.
pub const GLYPH_SPACING: u32 = 1;

/// Rows top to bottom, bit 4 is the leftmost column.
pub fn digit_rows(ch: char) -> Option<&'static [u8; 7]> {
    let rows: &'static [u8; 7] = match ch {
        '0' => &[0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => &[0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => &[0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => &[0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => &[0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => &[0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => &[0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => &[0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => &[0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => &[0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        _ => return None,
    };
    Some(rows)
}

/// Unscaled width of `text` in glyph cells.
pub fn text_width(text: &str) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        n * GLYPH_WIDTH + (n - 1) * GLYPH_SPACING
    }
}

/// Lit cells of `text` as `(column, row)` in unscaled glyph units.
pub fn lit_cells(text: &str) -> Vec<(u32, u32)> {
    let mut cells = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = digit_rows(ch) else {
            continue;
        };
        let x0 = i as u32 * (GLYPH_WIDTH + GLYPH_SPACING);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    cells.push((x0 + col, row as u32));
                }
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_digit_has_a_glyph() {
        for ch in '0'..='9' {
            assert!(digit_rows(ch).is_some(), "missing glyph for {ch}");
        }
        assert!(digit_rows('x').is_none());
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("7"), 5);
        assert_eq!(text_width("12"), 11);
    }

    #[test]
    fn test_lit_cells_offsets_second_glyph() {
        // '1' has a single lit cell in its top row at column 2.
        let cells = lit_cells("11");
        assert!(cells.contains(&(2, 0)));
        assert!(cells.contains(&(8, 0)));
        assert!(cells.iter().all(|&(x, y)| x < 11 && y < 7));
    }
}
