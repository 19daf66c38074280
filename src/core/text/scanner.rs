//! Sequence scanning over arbitrary text: locate, split, filter, and match.
//!
//! Malformed or unterminated sequences never fail a scan. Their introducer is treated as
//! plain text and scanning resumes at the next character.

use std::collections::BTreeMap;

use bitflags::bitflags;

use super::sequence::{extract_at, is_incomplete, is_introducer, SequenceFamily, SequenceMatch};

bitflags! {
    /// Set of families a scan is restricted to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FamilySet: u8 {
        const C1 = 1 << 0;
        const ESC = 1 << 1;
        const CSI = 1 << 2;
        const DCS = 1 << 3;
        const OSC = 1 << 4;
        const APC = 1 << 5;
        const PM = 1 << 6;
        const ALL = Self::C1.bits()
            | Self::ESC.bits()
            | Self::CSI.bits()
            | Self::DCS.bits()
            | Self::OSC.bits()
            | Self::APC.bits()
            | Self::PM.bits();
    }
}

impl Default for FamilySet {
    fn default() -> Self {
        Self::ALL
    }
}

impl FamilySet {
    pub fn contains_family(self, family: SequenceFamily) -> bool {
        self.contains(FamilySet::from(family)) && family != SequenceFamily::None
    }
}

impl From<SequenceFamily> for FamilySet {
    fn from(family: SequenceFamily) -> Self {
        match family {
            SequenceFamily::None => FamilySet::empty(),
            SequenceFamily::C1 => FamilySet::C1,
            SequenceFamily::Esc => FamilySet::ESC,
            SequenceFamily::Csi => FamilySet::CSI,
            SequenceFamily::Dcs => FamilySet::DCS,
            SequenceFamily::Osc => FamilySet::OSC,
            SequenceFamily::Apc => FamilySet::APC,
            SequenceFamily::Pm => FamilySet::PM,
        }
    }
}

/// Matches of one scan call, in order of occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult<'a> {
    matches: Vec<SequenceMatch<'a>>,
}

impl<'a> ScanResult<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &SequenceMatch<'a>> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Ordered matches of one family.
    pub fn get(&self, family: SequenceFamily) -> Vec<SequenceMatch<'a>> {
        self.matches
            .iter()
            .filter(|found| found.family == family)
            .copied()
            .collect()
    }

    /// Matches grouped per family. Every real family has an entry, possibly empty.
    pub fn grouped(&self) -> BTreeMap<SequenceFamily, Vec<SequenceMatch<'a>>> {
        let mut groups: BTreeMap<_, Vec<_>> = SequenceFamily::ALL
            .iter()
            .map(|family| (*family, Vec::new()))
            .collect();
        for found in &self.matches {
            if let Some(group) = groups.get_mut(&found.family) {
                group.push(*found);
            }
        }
        groups
    }

    pub fn into_vec(self) -> Vec<SequenceMatch<'a>> {
        self.matches
    }
}

/// Iterator over the sequences of the requested families, left to right.
#[derive(Debug, Clone)]
pub struct Sequences<'a> {
    text: &'a str,
    pos: usize,
    families: FamilySet,
}

impl<'a> Iterator for Sequences<'a> {
    type Item = SequenceMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let Some(pos) = next_introducer(self.text, self.pos) else {
                self.pos = bytes.len();
                return None;
            };
            match extract_at(self.text, pos) {
                Some(found) => {
                    self.pos = found.end();
                    if self.families.contains_family(found.family) {
                        return Some(found);
                    }
                }
                None => self.pos = pos + char_len_at(self.text, pos),
            }
        }
        None
    }
}

fn next_introducer(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..bytes.len()).find(|&idx| is_introducer(text, idx))
}

fn char_len_at(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}

pub fn sequences(text: &str, families: FamilySet) -> Sequences<'_> {
    Sequences {
        text,
        pos: 0,
        families,
    }
}

/// Finds every sequence of the requested families.
pub fn scan(text: &str, families: FamilySet) -> ScanResult<'_> {
    ScanResult {
        matches: sequences(text, families).collect(),
    }
}

/// Replaces every matched sequence with `replacement`; all other text is kept in order.
///
/// With an empty replacement the result holds no sequence of `families`: removing a
/// sequence can join a stray introducer with the text after it, so passes repeat until
/// nothing matches.
pub fn filter(text: &str, replacement: &str, families: FamilySet) -> String {
    let mut out = filter_once(text, replacement, families);
    if replacement.is_empty() {
        while contains_any(&out, families) {
            out = filter_once(&out, "", families);
        }
    }
    out
}

fn filter_once(text: &str, replacement: &str, families: FamilySet) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in sequences(text, families) {
        out.push_str(&text[last..found.start]);
        out.push_str(replacement);
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Removes every sequence of every family.
pub fn strip(text: &str) -> String {
    filter(text, "", FamilySet::ALL)
}

/// Text between sequences. `n` sequences always produce `n + 1` parts.
pub fn split(text: &str, families: FamilySet) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for found in sequences(text, families) {
        parts.push(&text[last..found.start]);
        last = found.end();
    }
    parts.push(&text[last..]);
    parts
}

pub fn contains_any(text: &str, families: FamilySet) -> bool {
    sequences(text, families).next().is_some()
}

/// Presence of each real family within the requested set.
pub fn contains_per_family(text: &str, families: FamilySet) -> BTreeMap<SequenceFamily, bool> {
    let mut present: BTreeMap<SequenceFamily, bool> = SequenceFamily::ALL
        .iter()
        .filter(|family| families.contains_family(**family))
        .map(|family| (*family, false))
        .collect();
    for found in sequences(text, families) {
        present.insert(found.family, true);
    }
    present
}

/// Byte offset of a trailing sequence that the end of `text` cuts off, if any.
pub fn incomplete_tail(text: &str) -> Option<usize> {
    let mut pos = 0;
    while let Some(start) = next_introducer(text, pos) {
        match extract_at(text, start) {
            Some(found) => pos = found.end(),
            None if is_incomplete(text, start) => return Some(start),
            None => pos = start + char_len_at(text, start),
        }
    }
    None
}

/// Family of the first sequence in `text`, or `None` for plain text.
pub fn identify_first(text: &str) -> SequenceFamily {
    sequences(text, FamilySet::ALL)
        .next()
        .map_or(SequenceFamily::None, |found| found.family)
}
