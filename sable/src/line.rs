use anyhow::{anyhow, Result};

/// A peekable cursor over the whitespace separated tokens of a single
/// source line.
///
/// The raw line is kept around for copy handlers, the cleaned line (no
/// surrounding whitespace, no end-of-line comment) is what gets split into
/// tokens. Double quoted substrings survive splitting in one piece:
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use sable::line::Line;
///
/// let mut line = Line::new("    const-string v0, \"hello world\"");
/// assert_eq!(line.next().unwrap(), "const-string");
/// assert_eq!(line.next().unwrap(), "v0,");
/// assert_eq!(line.next().unwrap(), "\"hello world\"");
/// assert!(!line.has_next());
/// ```
#[derive(Debug, Clone)]
pub struct Line {
	raw: String,
	cleaned: String,
	eol_comment: Option<String>,
	tokens: Vec<String>,
	pos: usize,
}

impl Line {
	pub fn new(line: &str) -> Line {
		let raw = line.trim_end().to_owned();
		let trimmed = raw.trim_start();

		let (cleaned, eol_comment) = split_eol_comment(trimmed);
		let tokens = split_tokens(&cleaned);

		Line { raw, cleaned, eol_comment, tokens, pos: 0 }
	}

	/// The line as it came in, trailing whitespace removed.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// The trimmed line without any end-of-line comment.
	pub fn cleaned(&self) -> &str {
		&self.cleaned
	}

	pub fn eol_comment(&self) -> Option<&str> {
		self.eol_comment.as_deref()
	}

	pub fn is_empty(&self) -> bool {
		self.cleaned.is_empty()
	}

	/// Returns the current token without advancing.
	pub fn peek(&self) -> Option<&str> {
		self.tokens.get(self.pos).map(String::as_str)
	}

	/// Returns the current token and advances, failing past the end of
	/// the line.
	pub fn next(&mut self) -> Result<String> {
		let token = self.tokens.get(self.pos)
			.cloned()
			.ok_or_else(|| anyhow!("unexpected end of line: {:?}", self.raw))?;
		self.pos += 1;
		Ok(token)
	}

	/// The final token of the line, ignoring the cursor.
	pub fn last(&self) -> Result<&str> {
		self.tokens.last()
			.map(String::as_str)
			.ok_or_else(|| anyhow!("unexpected end of line: {:?}", self.raw))
	}

	pub fn has_next(&self) -> bool {
		self.pos < self.tokens.len()
	}
}

/// Splits off an end-of-line comment.
///
/// A `#` only starts a comment when the number of `"` before it is even,
/// so string literals containing `#` stay intact.
fn split_eol_comment(line: &str) -> (String, Option<String>) {
	let mut quotes = 0usize;
	for (index, char) in line.char_indices() {
		match char {
			'"' => quotes += 1,
			'#' if quotes % 2 == 0 => {
				let comment = line[index + 1..]
					.trim_start_matches([' ', '#'])
					.to_owned();
				let cleaned = line[..index].trim_end().to_owned();
				return (cleaned, Some(comment));
			},
			_ => {},
		}
	}
	(line.to_owned(), None)
}

/// Splits on spaces, keeping double quoted substrings intact.
fn split_tokens(cleaned: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut in_literal = false;

	for char in cleaned.chars() {
		match char {
			'"' => {
				in_literal = !in_literal;
				current.push('"');
			},
			' ' | '\t' if !in_literal => {
				if !current.is_empty() {
					tokens.push(std::mem::take(&mut current));
				}
			},
			_ => current.push(char),
		}
	}
	if !current.is_empty() {
		tokens.push(current);
	}
	tokens
}

#[cfg(test)]
mod testing {
	use pretty_assertions::assert_eq;
	use super::Line;

	#[test]
	fn tokens() {
		let mut line = Line::new("  .field public static x:I = 0x1  ");
		assert_eq!(line.peek(), Some(".field"));
		assert_eq!(line.next().unwrap(), ".field");
		assert_eq!(line.next().unwrap(), "public");
		assert_eq!(line.last().unwrap(), "0x1");
		assert!(line.has_next());
	}

	#[test]
	fn eol_comment() {
		let line = Line::new(".super Ljava/lang/Object; # the usual");
		assert_eq!(line.cleaned(), ".super Ljava/lang/Object;");
		assert_eq!(line.eol_comment(), Some("the usual"));
	}

	#[test]
	fn hash_inside_string_literal() {
		let mut line = Line::new("const-string v0, \"a # b\" # note");
		assert_eq!(line.eol_comment(), Some("note"));
		assert_eq!(line.next().unwrap(), "const-string");
		assert_eq!(line.next().unwrap(), "v0,");
		assert_eq!(line.next().unwrap(), "\"a # b\"");
	}

	#[test]
	fn whole_line_comment() {
		let line = Line::new("# just a comment");
		assert!(line.is_empty());
		assert_eq!(line.eol_comment(), Some("just a comment"));
	}

	#[test]
	fn past_the_end() {
		let mut line = Line::new(".prologue");
		assert!(line.next().is_ok());
		assert!(line.next().is_err());
	}
}
