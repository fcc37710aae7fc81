//! Text helpers for header labels and PDF string encoding

/// Turn a column name into a header label: underscores become spaces and
/// the result is title-cased (`product_id` -> `Product Id`).
pub fn header_label(column: &str) -> String {
    title_case(&column.replace('_', " "))
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
///
/// Digits and punctuation both start a new word, so `2nd` becomes `2Nd`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Encode text for the standard fonts' WinAnsiEncoding (Windows-1252).
/// Characters outside the code page become `?`.
pub fn encode_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            '\t' => b' ',
            _ => b'?',
        },
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: header labels never contain underscores
        #[test]
        fn labels_have_no_underscores(name in "[a-z_]{0,24}") {
            prop_assert!(!header_label(&name).contains('_'));
        }

        /// Property: title case keeps character count for ASCII input
        #[test]
        fn title_case_preserves_length(s in "[ -~]{0,32}") {
            prop_assert_eq!(title_case(&s).len(), s.len());
        }

        /// Property: encoded text has one byte per character
        #[test]
        fn win_ansi_one_byte_per_char(s in "\\PC{0,32}") {
            prop_assert_eq!(encode_win_ansi(&s).len(), s.chars().count());
        }
    }
}
