//! Soft page breaks for content rendered once.
//!
//! Lines are written into a viewport top to bottom. When the viewport is full the writer
//! blocks for a key press, blanks the viewport, and continues from its top row.

use crate::core::cursor::Coordinate;
use crate::core::port::ConsolePort;
use crate::core::text::wrap::wrap_words;
use crate::error::Result;
use crate::render::viewport::ViewportRect;

#[derive(Debug, Clone)]
pub struct SoftPageWriter {
    viewport: ViewportRect,
    row: usize,
    pauses: usize,
}

impl SoftPageWriter {
    pub fn new(viewport: ViewportRect) -> Self {
        Self {
            viewport,
            row: 0,
            pauses: 0,
        }
    }

    /// Pauses taken over the writer's lifetime.
    pub fn pauses(&self) -> usize {
        self.pauses
    }

    /// Word-wraps `text` to the viewport width and writes it. Returns the pauses taken.
    pub fn write_text(&mut self, port: &mut dyn ConsolePort, text: &str) -> Result<usize> {
        let width = usize::from(self.viewport.width).max(1);
        let lines = wrap_words(text, width);
        self.write_lines(port, &lines)
    }

    /// Writes pre-wrapped lines. Returns the pauses taken.
    pub fn write_lines<S: AsRef<str>>(
        &mut self,
        port: &mut dyn ConsolePort,
        lines: &[S],
    ) -> Result<usize> {
        if port.is_dumb() || self.viewport.is_unbounded() {
            for line in lines {
                port.write_line(line.as_ref())?;
            }
            return Ok(0);
        }

        let rows = usize::from(self.viewport.height).max(1);
        let before = self.pauses;
        for line in lines {
            if self.row >= rows {
                self.page_break(port)?;
            }
            let y = self.viewport.top.saturating_add(self.row as u16);
            port.set_cursor_position(Coordinate::new(self.viewport.left, y))?;
            port.write(line.as_ref())?;
            self.row += 1;
        }
        Ok(self.pauses - before)
    }

    fn page_break(&mut self, port: &mut dyn ConsolePort) -> Result<()> {
        self.pauses += 1;
        tracing::debug!(pause = self.pauses, "viewport full, waiting for a key");
        port.read_key()?;
        self.blank(port)?;
        self.row = 0;
        Ok(())
    }

    fn blank(&self, port: &mut dyn ConsolePort) -> Result<()> {
        let blank = " ".repeat(usize::from(self.viewport.width));
        for offset in 0..self.viewport.height {
            let y = self.viewport.top.saturating_add(offset);
            port.set_cursor_position(Coordinate::new(self.viewport.left, y))?;
            port.write(&blank)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SoftPageWriter;
    use crate::core::port::ConsolePort;
    use crate::core::cursor::Size;
    use crate::platform::sinks::MemoryPort;
    use crate::platform::virtual_terminal::VirtualTerminal;
    use crate::render::viewport::ViewportRect;

    #[test]
    fn pauses_once_per_full_viewport() {
        let mut term = VirtualTerminal::new(Size::new(20, 10));
        term.push_input("x");
        term.push_input("y");
        let lines: Vec<String> = (1..=7).map(|n| format!("line {n}")).collect();

        let mut writer = SoftPageWriter::new(ViewportRect::new(0, 0, 20, 3));
        let pauses = writer.write_lines(&mut term, &lines).expect("write");
        assert_eq!(pauses, 2);
        assert!(term.transcript().contains("line 7"));
        assert!(!term.key_available().expect("available"));
    }

    #[test]
    fn exact_fit_does_not_pause() {
        let mut term = VirtualTerminal::new(Size::new(20, 10));
        let mut writer = SoftPageWriter::new(ViewportRect::new(0, 0, 20, 3));
        assert_eq!(writer.write_lines(&mut term, &["a", "b", "c"]).expect("write"), 0);
    }

    #[test]
    fn dumb_output_never_pauses() {
        let mut port = MemoryPort::new();
        let mut writer = SoftPageWriter::new(ViewportRect::new(0, 0, 10, 2));
        let pauses = writer
            .write_text(&mut port, "one two three four five six seven")
            .expect("write");
        assert_eq!(pauses, 0);
        assert_eq!(port.contents().lines().count(), 4);
    }
}
