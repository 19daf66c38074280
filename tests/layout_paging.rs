use console_vt::render::paginate_count;
use console_vt::{
    is_overflowing, paginate, rows_available, ChoiceItem, ConsolePort, MemoryPort, NavDelta,
    SelectionList, Size, SoftPageWriter, ViewportRect, VirtualTerminal,
};
use pretty_assertions::assert_eq;

fn numbered(count: usize) -> Vec<ChoiceItem> {
    (1..=count)
        .map(|n| ChoiceItem::new(n.to_string(), format!("entry {n}")))
        .collect()
}

#[test]
fn page_down_far_past_the_end_equals_end() {
    let lines: Vec<String> = (0..1000).map(|n| n.to_string()).collect();
    let end = paginate(&lines, 20, 0, NavDelta::End);
    assert_eq!(end.start_index, 980);
    assert_eq!(end.end_index, 1000);

    let mut top = 0;
    for _ in 0..1000 {
        top = paginate(&lines, 20, top, NavDelta::PageDown).start_index;
    }
    assert_eq!(paginate(&lines, 20, top, NavDelta::By(0)), end);
    assert_eq!(paginate(&lines, 20, 0, NavDelta::By(1_000_000)), end);
}

#[test]
fn top_index_is_clamped_on_both_sides() {
    let up = paginate_count(1000, 20, 5, NavDelta::PageUp);
    assert_eq!(up.start_index, 0);
    assert_eq!(paginate_count(1000, 20, 3, NavDelta::By(-50)).start_index, 0);

    let short = paginate_count(7, 20, 4, NavDelta::PageDown);
    assert_eq!(short.start_index, 0);
    assert_eq!(short.visible_range(), 0..7);
    assert_eq!(short.page_count(), 1);
}

#[test]
fn empty_content_has_one_empty_page() {
    let empty: Vec<&str> = Vec::new();
    let state = paginate(&empty, 10, 3, NavDelta::End);
    assert_eq!(state.visible_range(), 0..0);
    assert_eq!(state.page_count(), 1);
}

#[test]
fn reserved_rows_shrink_the_content_area() {
    let rect = ViewportRect::new(0, 0, 80, 20);
    assert_eq!(rows_available(rect, 2), 18);
    assert_eq!(rows_available(ViewportRect::new(0, 0, 80, 1), 3), 0);

    let lines = vec!["x"; 19];
    assert!(!is_overflowing(&lines, 20, 1));
    assert!(is_overflowing(&lines, 20, 2));
}

#[test]
fn thousand_page_downs_stop_on_the_last_choice() {
    let list = SelectionList::new(numbered(1000)).expect("list");
    let viewport = ViewportRect::new(0, 0, 40, 20);
    let mut state = list.initial_state(viewport);
    assert_eq!(state.highlighted, 0);

    for _ in 0..1000 {
        state = list.handle(state, NavDelta::PageDown);
    }
    assert_eq!(state.highlighted, 999);
    assert_eq!(list.selected(&state).map(|item| item.name.as_str()), Some("1000"));

    // One row is kept for the position line.
    let rows_per_page = rows_available(viewport, 1);
    assert_eq!(state.page.page_size, rows_per_page);
    assert_eq!(state.page.page_count(), 1000usize.div_ceil(rows_per_page));
    assert_eq!(state.page.current_page() + 1, state.page.page_count());

    let end = list.handle(list.initial_state(viewport), NavDelta::End);
    assert_eq!(end, state);
}

#[test]
fn rendered_page_fits_the_viewport() {
    let list = SelectionList::new(numbered(50)).expect("list");
    let viewport = ViewportRect::new(0, 0, 30, 8);
    let state = list.handle(list.initial_state(viewport), NavDelta::PageDown);

    let rows = list.render(&state, viewport);
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0], "> 8) entry 8");
    assert_eq!(rows[7], "  [8/50] page 2/8");
}

#[test]
fn relayout_keeps_the_highlight_visible() {
    let list = SelectionList::new(numbered(100)).expect("list");
    let tall = ViewportRect::new(0, 0, 40, 50);
    let mut state = list.initial_state(tall);
    for _ in 0..40 {
        state = list.handle(state, NavDelta::LineDown);
    }
    assert_eq!(state.highlighted, 40);

    let short = ViewportRect::new(0, 0, 40, 10);
    let state = list.relayout(state, short);
    assert_eq!(state.highlighted, 40);
    assert!(state.page.visible_range().contains(&40));
}

#[test]
fn soft_paging_waits_for_a_key_per_full_viewport() {
    let mut term = VirtualTerminal::new(Size::new(30, 12));
    for key in ["a", "b", "c"] {
        term.push_input(key);
    }
    let text = (1..=10)
        .map(|n| format!("word{n}"))
        .collect::<Vec<_>>()
        .join(" ");

    // Ten words of 5-6 cells wrapped at 12 columns take five rows.
    let mut writer = SoftPageWriter::new(ViewportRect::new(0, 0, 12, 2));
    let pauses = writer.write_text(&mut term, &text).expect("write");
    assert_eq!(pauses, 2);
    assert_eq!(writer.pauses(), 2);
    assert!(term.key_available().expect("available"));
}

#[test]
fn soft_paging_never_pauses_on_a_sink() {
    let mut port = MemoryPort::new();
    let mut writer = SoftPageWriter::new(ViewportRect::new(0, 0, 10, 2));
    let lines = ["one", "two", "three", "four", "five"];
    assert_eq!(writer.write_lines(&mut port, &lines).expect("write"), 0);
    assert_eq!(port.contents(), "one\ntwo\nthree\nfour\nfive\n");
}
