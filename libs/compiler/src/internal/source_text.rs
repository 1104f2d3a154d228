/// Replaces `//` and `/* */` comments with spaces, leaving string literals intact.
/// Newlines are preserved so line numbers of the remaining text are unchanged.
pub fn strip_comments(source: &str) -> String {
  enum State {
    Code,
    Str(char),
    LineComment,
    BlockComment,
  }

  let mut out = String::with_capacity(source.len());
  let mut state = State::Code;
  let mut chars = source.chars().peekable();

  while let Some(ch) = chars.next() {
    match state {
      State::Code => match ch {
        '"' | '\'' => {
          state = State::Str(ch);
          out.push(ch);
        }
        '/' if chars.peek() == Some(&'/') => {
          chars.next();
          state = State::LineComment;
          out.push_str("  ");
        }
        '/' if chars.peek() == Some(&'*') => {
          chars.next();
          state = State::BlockComment;
          out.push_str("  ");
        }
        _ => out.push(ch),
      },
      State::Str(quote) => {
        out.push(ch);
        if ch == '\\' {
          if let Some(escaped) = chars.next() {
            out.push(escaped);
          }
        } else if ch == quote || ch == '\n' {
          state = State::Code;
        }
      }
      State::LineComment => {
        if ch == '\n' {
          state = State::Code;
          out.push('\n');
        } else {
          out.push(' ');
        }
      }
      State::BlockComment => {
        if ch == '*' && chars.peek() == Some(&'/') {
          chars.next();
          state = State::Code;
          out.push_str("  ");
        } else if ch == '\n' {
          out.push('\n');
        } else {
          out.push(' ');
        }
      }
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn removes_line_and_block_comments() {
    let source = "a // one\nb /* two\nthree */ c";
    let stripped = strip_comments(source);
    assert_eq!(stripped.lines().count(), 3);
    assert!(!stripped.contains("one"));
    assert!(!stripped.contains("two"));
    assert!(!stripped.contains("three"));
    assert!(stripped.contains('c'));
  }

  #[test]
  fn keeps_comment_markers_inside_strings() {
    let source = r#"import "http://example/A.sol"; // trailing"#;
    let stripped = strip_comments(source);
    assert!(stripped.contains("\"http://example/A.sol\""));
    assert!(!stripped.contains("trailing"));
  }
}
