//! SGR state tracking, used to carry styles across wrapped lines.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    struct Attrs: u16 {
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const BLINK = 1 << 4;
        const INVERSE = 1 << 5;
        const HIDDEN = 1 << 6;
        const STRIKE = 1 << 7;
    }
}

const ATTR_CODES: [(Attrs, &str); 8] = [
    (Attrs::BOLD, "1"),
    (Attrs::DIM, "2"),
    (Attrs::ITALIC, "3"),
    (Attrs::UNDERLINE, "4"),
    (Attrs::BLINK, "5"),
    (Attrs::INVERSE, "7"),
    (Attrs::HIDDEN, "8"),
    (Attrs::STRIKE, "9"),
];

/// Accumulated effect of SGR (`ESC[...m`) sequences seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgrTracker {
    attrs: Attrs,
    fg: Option<String>,
    bg: Option<String>,
}

impl SgrTracker {
    /// Applies one sequence. Anything other than a 7-bit SGR is ignored.
    pub fn process(&mut self, sequence: &str) {
        let Some(params) = sequence
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };

        if params.is_empty() {
            self.reset();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let code = parts[idx].parse::<u16>().unwrap_or(0);
            if code == 38 || code == 48 {
                let span = match parts.get(idx + 1).copied() {
                    Some("5") => 3,
                    Some("2") => 5,
                    _ => 1,
                };
                if span > 1 && idx + span <= parts.len() {
                    let color = parts[idx..idx + span].join(";");
                    if code == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    idx += span;
                    continue;
                }
            }
            self.apply_code(code);
            idx += 1;
        }
    }

    fn apply_code(&mut self, code: u16) {
        match code {
            0 => self.reset(),
            1 => self.attrs.insert(Attrs::BOLD),
            2 => self.attrs.insert(Attrs::DIM),
            3 => self.attrs.insert(Attrs::ITALIC),
            4 => self.attrs.insert(Attrs::UNDERLINE),
            5 => self.attrs.insert(Attrs::BLINK),
            7 => self.attrs.insert(Attrs::INVERSE),
            8 => self.attrs.insert(Attrs::HIDDEN),
            9 => self.attrs.insert(Attrs::STRIKE),
            21 => self.attrs.remove(Attrs::BOLD),
            22 => self.attrs.remove(Attrs::BOLD | Attrs::DIM),
            23 => self.attrs.remove(Attrs::ITALIC),
            24 => self.attrs.remove(Attrs::UNDERLINE),
            25 => self.attrs.remove(Attrs::BLINK),
            27 => self.attrs.remove(Attrs::INVERSE),
            28 => self.attrs.remove(Attrs::HIDDEN),
            29 => self.attrs.remove(Attrs::STRIKE),
            39 => self.fg = None,
            49 => self.bg = None,
            30..=37 | 90..=97 => self.fg = Some(code.to_string()),
            40..=47 | 100..=107 => self.bg = Some(code.to_string()),
            _ => {}
        }
    }

    pub fn is_plain(&self) -> bool {
        self.attrs.is_empty() && self.fg.is_none() && self.bg.is_none()
    }

    /// One SGR sequence re-establishing the current state, or an empty string.
    pub fn active_codes(&self) -> String {
        if self.is_plain() {
            return String::new();
        }
        let mut codes: Vec<&str> = ATTR_CODES
            .iter()
            .filter(|(attr, _)| self.attrs.contains(*attr))
            .map(|(_, code)| *code)
            .collect();
        if let Some(fg) = self.fg.as_deref() {
            codes.push(fg);
        }
        if let Some(bg) = self.bg.as_deref() {
            codes.push(bg);
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
