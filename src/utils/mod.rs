mod parse;
pub use parse::*;

const REPORT_WIDTH: usize = 70;

/// Horizontal rule used to frame text reports
pub fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(REPORT_WIDTH).collect()
}

pub const EMPTY_VALUE: &str = "---";

pub fn maybe_string<T>(item: Option<&T>) -> String
where
    T: ToString,
{
    item.map(std::string::ToString::to_string)
        .unwrap_or_else(|| String::from(EMPTY_VALUE))
}

/// Leading whitespace of a config line, preserved when inserting siblings
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

/// Indentation depth (in characters) of a config line
pub fn indent_of(line: &str) -> usize {
    leading_whitespace(line).chars().count()
}
