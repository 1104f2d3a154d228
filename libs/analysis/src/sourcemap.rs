//! Decoding of solc's compressed source maps and offset to line/column translation.

/// One instruction's source range. `file` is `-1` for compiler-generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMapEntry {
  pub start: usize,
  pub length: usize,
  pub file: i64,
}

/// Expands a compressed map (`s:l:f:j:m;...`). Empty fields repeat the previous entry's value;
/// unparsable fields are treated as empty.
pub fn decode(map: &str) -> Vec<SourceMapEntry> {
  if map.is_empty() {
    return Vec::new();
  }

  let mut current = SourceMapEntry {
    start: 0,
    length: 0,
    file: -1,
  };
  map
    .split(';')
    .map(|item| {
      let mut fields = item.split(':');
      if let Some(start) = fields.next().and_then(|f| f.parse().ok()) {
        current.start = start;
      }
      if let Some(length) = fields.next().and_then(|f| f.parse().ok()) {
        current.length = length;
      }
      if let Some(file) = fields.next().and_then(|f| f.parse().ok()) {
        current.file = file;
      }
      current
    })
    .collect()
}

/// Byte offset of every instruction in a bytecode object. `PUSH1`..`PUSH32` carry 1 to 32
/// inline data bytes, so offsets inside push data are not instruction starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionOffsets {
  starts: Vec<usize>,
}

impl InstructionOffsets {
  /// Walks hex bytecode, `0x` prefix optional. Only opcode bytes are parsed: library link
  /// placeholders sit inside `PUSH20` data and are skipped over.
  pub fn new(bytecode: &str) -> Self {
    let code = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    let mut starts = Vec::new();
    let mut offset = 0;
    while let Some(opcode) = code
      .get(2 * offset..2 * offset + 2)
      .and_then(|byte| u8::from_str_radix(byte, 16).ok())
    {
      starts.push(offset);
      offset += 1 + push_width(opcode);
    }
    Self { starts }
  }

  /// Instruction number starting at `offset`, as indexed by the source map.
  pub fn instruction_at(&self, offset: usize) -> Option<usize> {
    self.starts.binary_search(&offset).ok()
  }

  pub fn len(&self) -> usize {
    self.starts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.starts.is_empty()
  }
}

fn push_width(opcode: u8) -> usize {
  match opcode {
    0x60..=0x7f => usize::from(opcode - 0x5f),
    _ => 0,
  }
}

/// Line start offsets of a text, for 1-based line/column lookup.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
  text: &'a str,
  line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  pub fn new(text: &'a str) -> Self {
    let line_starts = std::iter::once(0)
      .chain(text.match_indices('\n').map(|(index, _)| index + 1))
      .collect();
    Self { text, line_starts }
  }

  /// 1-based line and column (in characters) of a byte offset; `None` past the end of the text.
  pub fn line_column(&self, offset: usize) -> Option<(usize, usize)> {
    if offset > self.text.len() {
      return None;
    }
    let line = self.line_starts.partition_point(|&start| start <= offset);
    let line_start = self.line_starts[line - 1];
    let column = self
      .text
      .get(line_start..offset)
      .map(|prefix| prefix.chars().count())
      .unwrap_or(offset - line_start);
    Some((line, column + 1))
  }
}
