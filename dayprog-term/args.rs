//! Value parsers for command line arguments.

use dayprog_lib::{
  selection::Range,
  view::Viewport,
};

fn split_pair(value: &str) -> Result<(usize, usize), String> {
  let (left, right) = value
    .split_once(':')
    .ok_or_else(|| format!("expected two numbers separated by ':', got {value:?}"))?;
  let parse = |part: &str| {
    part
      .trim()
      .parse::<usize>()
      .map_err(|err| format!("invalid number {part:?}: {err}"))
  };
  Ok((parse(left)?, parse(right)?))
}

/// `FROM:TO`, a char range. `TO` may be smaller than `FROM` for a backward
/// selection.
pub fn parse_range(value: &str) -> Result<Range, String> {
  let (anchor, head) = split_pair(value)?;
  Ok(Range::new(anchor, head))
}

/// `TOP:HEIGHT`, in lines.
pub fn parse_viewport(value: &str) -> Result<Viewport, String> {
  let (top, height) = split_pair(value)?;
  if height == 0 {
    return Err("viewport height must be at least one line".to_string());
  }
  Ok(Viewport::new(top, height))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn ranges() {
    assert_eq!(parse_range("3:9"), Ok(Range::new(3, 9)));
    assert_eq!(parse_range("9:3"), Ok(Range::new(9, 3)));
    assert_eq!(parse_range(" 4 : 4 "), Ok(Range::point(4)));
    assert!(parse_range("3").is_err());
    assert!(parse_range("a:3").is_err());
    assert!(parse_range("-1:3").is_err());
  }

  #[test]
  fn viewports() {
    assert_eq!(parse_viewport("10:20"), Ok(Viewport::new(10, 20)));
    assert!(parse_viewport("10:0").is_err());
    assert!(parse_viewport("10").is_err());
  }
}
