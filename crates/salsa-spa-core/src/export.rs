//! CSV export of per-word levels.

use std::io::Write;

use crate::matcher::WordMatch;

/// Header row of the word-level CSV.
pub const WORD_LEVELS_HEADER: [&str; 2] = ["Word", "CEFR Level"];

/// Write `matches` as a two-column `Word,CEFR Level` CSV.
///
/// Unknown words are written with the level `unknown`.
pub fn write_word_levels_csv<W: Write>(matches: &[WordMatch], writer: W) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(WORD_LEVELS_HEADER)?;
    for m in matches {
        csv.write_record([m.text.as_str(), m.label()])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CefrLevel;

    #[test]
    fn writes_header_and_rows() {
        let matches = vec![
            WordMatch {
                text: "tener en cuenta".to_string(),
                level: Some(CefrLevel::B2),
            },
            WordMatch {
                text: "foo".to_string(),
                level: None,
            },
        ];
        let mut out = Vec::new();
        write_word_levels_csv(&matches, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Word,CEFR Level\ntener en cuenta,B2\nfoo,unknown\n"
        );
    }

    #[test]
    fn empty_input_writes_only_header() {
        let mut out = Vec::new();
        write_word_levels_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Word,CEFR Level\n");
    }
}
