#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellGlyph {
    pub ch: char,
    /// Position of `ch` in the gradient that produced it.
    pub level: usize,
}

impl CellGlyph {
    pub const BLANK: CellGlyph = CellGlyph { ch: ' ', level: 0 };

    pub fn new(ch: char, level: usize) -> Self {
        Self { ch, level }
    }
}

/// Fixed-size glyph array. `width` counts text columns, so every source cell
/// occupies `repeat` consecutive columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    pub width: u32,
    pub height: u32,
    pub repeat: u32,
    pub cells: Vec<CellGlyph>,
}

impl GlyphGrid {
    pub fn blank(source_columns: u32, rows: u32, repeat: u32) -> Self {
        let repeat = repeat.max(1);
        let width = source_columns * repeat;
        let cells = vec![CellGlyph::BLANK; width as usize * rows as usize];
        Self { width, height: rows, repeat, cells }
    }

    pub fn set(&mut self, row: u32, col: u32, cell: CellGlyph) {
        let idx = self.index(row, col);
        self.cells[idx] = cell;
    }

    pub fn cell(&self, row: u32, col: u32) -> &CellGlyph {
        &self.cells[self.index(row, col)]
    }

    /// Downsampled cell column a text column was derived from.
    pub fn source_column(&self, col: u32) -> u32 {
        col / self.repeat.max(1)
    }

    pub fn source_columns(&self) -> u32 {
        self.width / self.repeat.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `(row, col, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &CellGlyph)> + '_ {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (idx as u32 / width, idx as u32 % width, cell))
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        let width = self.width.max(1) as usize;
        self.cells.chunks(width).map(|row| row.iter().map(|cell| cell.ch).collect::<String>())
    }

    /// Newline-terminated text rendering of the grid.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.rows() {
            text.push_str(&row);
            text.push('\n');
        }
        text
    }

    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }
}
