use proptest::prelude::*;

use super::*;
use crate::{parse_incremental, EditInfo};

// A bounded generator over the supported grammar subset.
fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        ("[a-z]{1,6}", "[a-z]{1,6}", "[a-z]{1,6}")
            .prop_map(|(a, b, c)| format!("{} *{}* {}", a, b, c)),
        "[a-z]{1,8}".prop_map(|w| format!("# {}", w)),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(a, b)| format!("- {}\n- {}", a, b)),
        ("[1-9]", "[a-z]{1,6}").prop_map(|(n, w)| format!("{}. {}", n, w)),
        "[a-z]{1,8}".prop_map(|w| format!("```\n{}\n```", w)),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(a, b)| format!("> {}\n> {}", a, b)),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(a, b)| format!("[{}](/{} 'z')", a, b)),
        ("[a-z]{1,6}", "[a-z]{1,6}").prop_map(|(a, b)| format!("{}  \n{}", a, b)),
        Just("---".to_string()),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(block(), 1..6).prop_map(|blocks| {
        let mut s = blocks.join("\n\n");
        s.push('\n');
        s
    })
}

fn splice(source: &str, start: usize, old_end: usize, insert: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out: String = chars[..start].iter().collect();
    out.push_str(insert);
    out.extend(&chars[old_end..]);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn parse_then_serialize_is_identity(source in document()) {
        let doc = parse(&source);
        prop_assert_eq!(serialize(&doc, &Options::default()), source);
    }

    #[test]
    fn serialize_is_idempotent(source in document()) {
        let options = Options::default();
        let once = serialize(&parse(&source), &options);
        let twice = serialize(&parse(&once), &options);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn strict_mode_is_still_lossless(source in document()) {
        let mut options = Options::default();
        options.parse.strict = true;
        let doc = crate::parse_document(&source, &options);
        prop_assert_eq!(serialize(&doc, &options), source);
    }

    #[test]
    fn incremental_equals_full_parse(
        source in document(),
        start_frac in 0.0f64..1.0,
        len in 0usize..4,
        insert in "[a-z \n#*->`]{0,6}",
    ) {
        let options = Options::default();
        let old = crate::parse_document(&source, &options);

        let cp_len = source.chars().count();
        let start = ((cp_len as f64) * start_frac) as usize;
        let start = start.min(cp_len);
        let old_end = (start + len).min(cp_len);
        let new_source = splice(&source, start, old_end, &insert);

        let edit = EditInfo {
            start,
            old_end,
            new_end: start + insert.chars().count(),
        };
        let incremental = parse_incremental(&old, &source, &new_source, &edit, &options);
        let full = crate::parse_document(&new_source, &options);
        prop_assert_eq!(incremental, full);
    }

    #[test]
    fn top_level_spans_always_tile(source in document()) {
        let doc = parse(&source);
        let mut pos = 0;
        for b in &doc.blocks {
            prop_assert_eq!(b.span.from, pos);
            pos = b.span.to;
        }
        prop_assert_eq!(pos, doc.span.to);
    }
}
