mod fixture;

use console_vt::scanner::{filter, identify_first, scan, split, strip};
use console_vt::{visible_width, wrap, wrap_words, FamilySet, SequenceFamily};
use fixture::read_table;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:!]{0,24}"
}

fn string_body() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9;:/. =]{0,16}"
}

fn string_terminator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\x07"), Just("\x1b\\"), Just("\u{9c}")]
}

/// One well-formed sequence and the family it belongs to.
fn sequence() -> impl Strategy<Value = (String, SequenceFamily)> {
    prop_oneof![
        ("[0-9;]{0,8}", "[@-~]").prop_map(|(params, final_byte)| {
            (format!("\x1b[{params}{final_byte}"), SequenceFamily::Csi)
        }),
        (string_body(), string_terminator())
            .prop_map(|(body, st)| (format!("\x1b]{body}{st}"), SequenceFamily::Osc)),
        (string_body(), string_terminator())
            .prop_map(|(body, st)| (format!("\x1bP{body}{st}"), SequenceFamily::Dcs)),
        (string_body(), string_terminator())
            .prop_map(|(body, st)| (format!("\x1b_{body}{st}"), SequenceFamily::Apc)),
        (string_body(), string_terminator())
            .prop_map(|(body, st)| (format!("\x1b^{body}{st}"), SequenceFamily::Pm)),
        "[ -/]{1,2}[0-~]".prop_map(|tail| (format!("\x1b{tail}"), SequenceFamily::Esc)),
        "[0-9`-~]".prop_map(|code| (format!("\x1b{code}"), SequenceFamily::Esc)),
        "[@-MQ-Z]".prop_map(|code| (format!("\x1b{code}"), SequenceFamily::C1)),
    ]
}

/// Plain text interleaved with well-formed sequences.
fn mixed_text() -> impl Strategy<Value = String> {
    prop::collection::vec((plain_text(), sequence()), 0..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(plain, (seq, _))| format!("{plain}{seq}"))
            .collect()
    })
}

/// Like [`mixed_text`], with stray introducers that never complete on their own.
fn noisy_text() -> impl Strategy<Value = String> {
    let stray = prop_oneof![
        Just(""),
        Just("\x1b"),
        Just("\x1b["),
        Just("\x1b]"),
        Just("\x1b[1;"),
        Just("\x1bP"),
    ];
    prop::collection::vec((plain_text(), stray, sequence()), 0..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(plain, stray, (seq, _))| format!("{plain}{stray}{seq}"))
            .collect()
    })
}

proptest! {
    #[test]
    fn single_sequence_is_found_at_any_position(
        prefix in plain_text(),
        (seq, family) in sequence(),
        suffix in plain_text(),
    ) {
        let text = format!("{prefix}{seq}{suffix}");
        let result = scan(&text, FamilySet::ALL);
        prop_assert_eq!(result.len(), 1);
        let found = result.iter().next().copied().expect("one match");
        prop_assert_eq!(found.family, family);
        prop_assert_eq!(found.start, prefix.len());
        prop_assert_eq!(found.text, seq.as_str());
        prop_assert_eq!(filter(&text, "", FamilySet::ALL), format!("{prefix}{suffix}"));
        prop_assert_eq!(identify_first(&text), family);
    }

    #[test]
    fn excluded_family_leaves_text_untouched(
        prefix in plain_text(),
        (seq, family) in sequence(),
        suffix in plain_text(),
    ) {
        let text = format!("{prefix}{seq}{suffix}");
        let others = FamilySet::ALL.difference(FamilySet::from(family));
        prop_assert!(scan(&text, others).is_empty());
        prop_assert_eq!(filter(&text, "#", others), text);
    }

    #[test]
    fn bel_and_st_terminators_are_equivalent(
        prefix in plain_text(),
        body in string_body(),
        suffix in plain_text(),
    ) {
        let bel = format!("{prefix}\x1b]{body}\x07{suffix}");
        let st = format!("{prefix}\x1b]{body}\x1b\\{suffix}");
        let st8 = format!("{prefix}\x1b]{body}\u{9c}{suffix}");
        prop_assert_eq!(strip(&bel), strip(&st));
        prop_assert_eq!(strip(&st), strip(&st8));
        prop_assert_eq!(identify_first(&bel), SequenceFamily::Osc);
    }

    #[test]
    fn filtering_twice_equals_filtering_once(text in mixed_text()) {
        let once = strip(&text);
        prop_assert_eq!(strip(&once), once.clone());
        prop_assert!(scan(&once, FamilySet::ALL).is_empty());
    }

    #[test]
    fn stray_introducers_never_leave_residual_sequences(text in noisy_text()) {
        let once = strip(&text);
        prop_assert!(scan(&once, FamilySet::ALL).is_empty());
        prop_assert_eq!(strip(&once), once.clone());

        let csi_only = filter(&text, "", FamilySet::CSI);
        prop_assert_eq!(filter(&csi_only, "", FamilySet::CSI), csi_only);
    }

    #[test]
    fn split_has_one_more_part_than_matches(text in mixed_text()) {
        let matches = scan(&text, FamilySet::ALL).len();
        let parts = split(&text, FamilySet::ALL);
        prop_assert_eq!(parts.len(), matches + 1);
        prop_assert_eq!(parts.concat(), strip(&text));
    }

    #[test]
    fn wrapped_lines_fit_and_rewrap_to_themselves(
        text in "[a-z ]{0,60}",
        width in 1usize..40,
    ) {
        for line in wrap(&text, width) {
            prop_assert!(visible_width(&line) <= width);
            prop_assert_eq!(wrap(&line, width), vec![line.clone()]);
        }
        for line in wrap_words(&text, width) {
            prop_assert!(visible_width(&line) <= width);
            prop_assert_eq!(wrap_words(&line, width), vec![line.clone()]);
        }
    }
}

#[test]
fn first_family_vectors() {
    for row in read_table("first_family.tsv") {
        let [input, expected] = row.as_slice() else {
            panic!("malformed row: {row:?}");
        };
        assert_eq!(
            format!("{:?}", identify_first(input)),
            *expected,
            "input {input:?}"
        );
    }
}

#[test]
fn strip_vectors() {
    for row in read_table("strip.tsv") {
        let [input, expected] = row.as_slice() else {
            panic!("malformed row: {row:?}");
        };
        assert_eq!(strip(input), *expected, "input {input:?}");
    }
}

#[test]
fn classify_looks_only_at_the_introducer() {
    use console_vt::classify;

    let text = "ab\x1b[1mcd\x1b]0;t";
    assert_eq!(classify(text, 0), SequenceFamily::None);
    assert_eq!(classify(text, 2), SequenceFamily::Csi);
    // Unterminated, but still an OSC introducer.
    assert_eq!(classify(text, 8), SequenceFamily::Osc);
}
