//! Source map v3 builder (spec §4.6). Hand-rolled base64-VLQ segment
//! encoding since mapping generation is a handful of lines and pulling in a
//! dedicated crate for it would be the only place in the ambient stack that
//! reaches outside what the teacher/pack already use.

use serde_json::json;

/// One mapping: a generated position plus the source position it came
/// from. Columns and lines are both 0-based here (source map convention),
/// converted from the 1-based positions [`crate::ast::css::Origin`] keeps.
#[derive(Debug, Clone, Copy)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub source_line: u32,
    pub source_column: u32,
}

const BASE64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(value: i64, out: &mut String) {
    let mut v = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = (v & 0b11111) as u8;
        v >>= 5;
        if v > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_ALPHABET[digit as usize] as char);
        if v == 0 {
            break;
        }
    }
}

/// Encodes `mappings` (assumed already sorted by `(generated_line,
/// generated_column)`) into the `mappings` field's VLQ-segment grammar.
fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut prev_generated_line = 0u32;
    let mut prev_generated_column = 0i64;
    let mut prev_source_index = 0i64;
    let mut prev_source_line = 0i64;
    let mut prev_source_column = 0i64;

    for (i, m) in mappings.iter().enumerate() {
        if m.generated_line != prev_generated_line {
            out.push_str(&";".repeat((m.generated_line - prev_generated_line) as usize));
            prev_generated_column = 0;
            prev_generated_line = m.generated_line;
        } else if i > 0 {
            out.push(',');
        }
        encode_vlq(m.generated_column as i64 - prev_generated_column, &mut out);
        encode_vlq(m.source_index as i64 - prev_source_index, &mut out);
        encode_vlq(m.source_line as i64 - prev_source_line, &mut out);
        encode_vlq(m.source_column as i64 - prev_source_column, &mut out);
        prev_generated_column = m.generated_column as i64;
        prev_source_index = m.source_index as i64;
        prev_source_line = m.source_line as i64;
        prev_source_column = m.source_column as i64;
    }
    out
}

/// Builds a source map v3 JSON document. `sources_content` is `None` per
/// source when `CompileOptions::source_map_include_sources` is off.
pub fn build(file: &str, sources: &[String], sources_content: Option<&[Option<String>]>, mappings: &[Mapping]) -> String {
    let empty_names: Vec<String> = Vec::new();
    let mut doc = json!({
        "version": 3,
        "file": file,
        "sources": sources,
        "names": empty_names,
        "mappings": encode_mappings(mappings),
    });
    if let Some(contents) = sources_content {
        doc["sourcesContent"] = json!(contents);
    }
    doc.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(generated_line: u32, generated_column: u32, source_line: u32, source_column: u32) -> Mapping {
        Mapping { generated_line, generated_column, source_index: 0, source_line, source_column }
    }

    #[test]
    fn a_zero_delta_vlq_digit_encodes_as_a_single_a() {
        let mut out = String::new();
        encode_vlq(0, &mut out);
        assert_eq!(out, "A");
    }

    #[test]
    fn negative_values_set_the_vlq_sign_bit() {
        let mut out = String::new();
        encode_vlq(-1, &mut out);
        assert_eq!(out, "D");
    }

    #[test]
    fn two_mappings_on_the_same_line_are_comma_separated() {
        let encoded = encode_mappings(&[mapping(0, 0, 0, 0), mapping(0, 4, 0, 4)]);
        assert_eq!(encoded, "AAAA,IAAI");
    }

    #[test]
    fn a_new_generated_line_emits_a_semicolon_and_resets_the_column_delta() {
        let encoded = encode_mappings(&[mapping(0, 0, 0, 0), mapping(1, 0, 1, 0)]);
        assert_eq!(encoded, "AAAA;AACA");
    }

    #[test]
    fn build_omits_sources_content_when_not_requested() {
        let doc = build("out.css", &["in.scss".to_string()], None, &[mapping(0, 0, 0, 0)]);
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed["version"], 3);
        assert_eq!(parsed["file"], "out.css");
        assert_eq!(parsed["mappings"], "AAAA");
        assert!(parsed.get("sourcesContent").is_none());
    }

    #[test]
    fn build_includes_sources_content_when_provided() {
        let doc = build("out.css", &["in.scss".to_string()], Some(&[Some("a { b: c; }".to_string())]), &[]);
        let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed["sourcesContent"][0], "a { b: c; }");
    }
}
