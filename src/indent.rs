use std::fmt;

/// Indentation-tracking text writer: a line break emits the current depth
/// in repeated tab characters before any further writes.
pub struct IndentWriter<W: fmt::Write> {
    writer: W,
    level: usize,
}

impl<W: fmt::Write> IndentWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, level: 0 }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn back_indent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn new_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        for _ in 0..self.level {
            self.writer.write_char('\t')?;
        }
        Ok(())
    }

    /// Runs `block` one level deeper, bracketed by line breaks.
    pub fn new_line_indent_while(
        &mut self,
        block: impl FnOnce(&mut Self) -> fmt::Result,
    ) -> fmt::Result {
        self.indent();
        self.new_line()?;
        block(self)?;
        self.back_indent();
        self.new_line()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: fmt::Write> fmt::Write for IndentWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_str(s)
    }
}
