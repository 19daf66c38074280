#![allow(unused_imports)]

use console_vt::core::text::scanner::{
    contains_any, contains_per_family, filter, identify_first, incomplete_tail, scan, sequences,
    split, strip,
};
use console_vt::core::text::sequence::{extract_at, is_incomplete, is_introducer};
use console_vt::platform::cursor_query::{parse_cursor_report, parse_window_report};
use console_vt::render::{paginate_count, MINIMUM_HEIGHT, MINIMUM_WIDTH};
use console_vt::{
    check_console_size, classify, effective_window_size, filtered_position, init_debug_log,
    is_overflowing, is_raw_mode, open_port, pad_to_width, paginate, query_cursor_position,
    query_window_size, rows_available, scanner, truncate_to_width, visible_width, wrap, wrap_words,
    write_lock, BackendKind, Choice, ChoiceItem, ConsoleError, ConsolePort, Coordinate,
    CyclicRefresher, DeviceCapabilities, DeviceState, DiscardPort, EnvConfig, FamilySet,
    FileSinkPort, InterruptHandle, Key, KeyPress, LineReader, LiveTerminal, MemoryPort, Modifiers,
    NavDelta, PageState, PendingInput, QueryChannel, ResizeListener, Result, ScanResult,
    SelectionList, SelectionState, SequenceFamily, SequenceMatch, Size, SizeRequirement,
    SoftPageWriter, TerminalCmd, ViewportRect, VirtualTerminal,
};

#[test]
fn public_api_imports_compile() {}
