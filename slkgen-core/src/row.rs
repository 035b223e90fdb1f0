use std::fmt;

/// Column reserved for the row key in every templated kind.
pub const KEY_COLUMN: u32 = 1;

/// Replaces an empty text value; the format cannot express `K""`.
pub const EMPTY_TEXT: &str = "_";

/// Marks a text column the unit never set.
pub const UNSET_TEXT: &str = "-";

/// One `C;X<column>;K<value>` record. `value` is the rendered payload,
/// quotes included for text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlkCell {
    pub column: u32,
    pub value: String,
}

impl SlkCell {
    pub fn raw(column: u32, value: impl Into<String>) -> Self {
        SlkCell {
            column,
            value: value.into(),
        }
    }

    /// Quotes `text`, substituting [`EMPTY_TEXT`] for an empty string.
    pub fn text(column: u32, text: &str) -> Self {
        let text = if text.is_empty() { EMPTY_TEXT } else { text };
        SlkCell::raw(column, format!("\"{text}\""))
    }

    /// Same payload placed in another column.
    pub fn copied_to(&self, column: u32) -> Self {
        SlkCell::raw(column, self.value.clone())
    }
}

impl fmt::Display for SlkCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C;X{};K{}", self.column, self.value)
    }
}

/// Cells of one unit in one templated kind, in placement order.
#[derive(Clone, Debug)]
pub struct UnitRow {
    unit_id: String,
    ordinal: usize,
    cells: Vec<SlkCell>,
}

impl UnitRow {
    pub fn new(unit_id: &str, ordinal: usize) -> Self {
        UnitRow {
            unit_id: unit_id.to_string(),
            ordinal,
            cells: Vec::new(),
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn cells(&self) -> &[SlkCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn position(&self, column: u32) -> Option<usize> {
        self.cells.iter().position(|c| c.column == column)
    }

    pub fn contains(&self, column: u32) -> bool {
        self.position(column).is_some()
    }

    pub fn get(&self, column: u32) -> Option<&SlkCell> {
        self.cells.iter().find(|c| c.column == column)
    }

    pub fn push(&mut self, cell: SlkCell) {
        self.cells.push(cell);
    }

    /// Inserts at `index`, clamped to the end of the row.
    pub fn insert_at(&mut self, index: usize, cell: SlkCell) {
        let index = index.min(self.cells.len());
        self.cells.insert(index, cell);
    }

    /// Inserts `cell` `offset` places after the first cell in `anchor`.
    /// Returns false when the anchor column is absent.
    pub fn insert_after(&mut self, anchor: u32, offset: usize, cell: SlkCell) -> bool {
        match self.position(anchor) {
            Some(pos) => {
                self.insert_at(pos + offset, cell);
                true
            }
            None => false,
        }
    }

    pub fn key_line(&self) -> String {
        format!(
            "C;X{KEY_COLUMN};Y{};K\"{}\"",
            self.ordinal, self.unit_id
        )
    }

    /// Key line followed by one line per cell.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.key_line()).chain(self.cells.iter().map(ToString::to_string))
    }
}
