use once_cell::sync::Lazy;
use regex::Regex;
use solar::parse::{
  ast::{self, ItemKind, PragmaTokens},
  interface::{self, source_map::FileName, Session},
  Parser as SolarParser,
};
use tracing::debug;

use super::parse::{AnalyzerError, ParsedData, SourceAnalyzer};

/// Reads import directives and `pragma solidity` requirements from solar's parse tree.
///
/// Sources solar rejects are handed to [`RegexAnalyzer`] unless the analyzer is strict, so a
/// file with syntax errors still reaches the compiler, which reports them properly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarAnalyzer {
  strict: bool,
}

impl SolarAnalyzer {
  /// An analyzer that fails on sources solar cannot parse.
  pub fn strict() -> Self {
    Self { strict: true }
  }
}

impl SourceAnalyzer for SolarAnalyzer {
  fn analyze(&self, content: &str) -> Result<ParsedData, AnalyzerError> {
    match parse_with_solar(content) {
      Some(parsed) => Ok(parsed),
      None if self.strict => Err(AnalyzerError::Failed(
        "source is not valid Solidity".to_owned(),
      )),
      None => {
        debug!("solar rejected the source, scanning it lexically");
        RegexAnalyzer.analyze(content)
      }
    }
  }
}

fn parse_with_solar(content: &str) -> Option<ParsedData> {
  let sess = Session::builder().with_silent_emitter(None).build();
  sess
    .enter(|| -> interface::Result<ParsedData> {
      let arena = ast::Arena::new();
      let mut parser = SolarParser::from_source_code(
        &sess,
        &arena,
        FileName::Custom("source.sol".to_owned()),
        content.to_owned(),
      )?;
      let unit = parser.parse_file().map_err(|err| err.emit())?;

      let mut parsed = ParsedData::default();
      for item in unit.items.iter() {
        match &item.kind {
          ItemKind::Import(import) => parsed.imports.push(import.path.value.as_str().to_owned()),
          ItemKind::Pragma(pragma) => {
            if let PragmaTokens::Version(name, requirement) = &pragma.tokens {
              if name.as_str() == "solidity" {
                parsed.version_pragmas.push(requirement.to_string());
              }
            }
          }
          _ => {}
        }
      }
      Ok(parsed)
    })
    .ok()
}

static PRAGMA_SOLIDITY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\bpragma\s+solidity\s+([^;]+);").expect("valid pragma regex"));

// Runs over masked text, where string contents are blanks; group 1 spans the import path.
static IMPORT_PATH: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"\bimport\s*(?:[^;"']*?\bfrom\s*)?["']( *)["']"#).expect("valid import regex")
});

/// Two byte-aligned copies of `content`: `code` with comments blanked, and `masked` with
/// string literal contents blanked as well.
struct Masked {
  code: String,
  masked: String,
}

#[derive(Clone, Copy)]
enum Lexeme {
  Code,
  LineComment,
  BlockComment,
  Literal(char),
}

fn blank(output: &mut String, c: char) {
  if c == '\n' {
    output.push('\n');
  } else {
    output.extend(std::iter::repeat(' ').take(c.len_utf8()));
  }
}

fn mask(content: &str) -> Masked {
  let mut code = String::with_capacity(content.len());
  let mut masked = String::with_capacity(content.len());
  let mut chars = content.chars().peekable();
  let mut state = Lexeme::Code;

  while let Some(c) = chars.next() {
    match state {
      Lexeme::Code => match (c, chars.peek().copied()) {
        ('/', Some(next @ ('/' | '*'))) => {
          chars.next();
          for blanked in [&mut code, &mut masked] {
            blank(blanked, c);
            blank(blanked, next);
          }
          state = if next == '/' {
            Lexeme::LineComment
          } else {
            Lexeme::BlockComment
          };
        }
        ('"' | '\'', _) => {
          code.push(c);
          masked.push(c);
          state = Lexeme::Literal(c);
        }
        _ => {
          code.push(c);
          masked.push(c);
        }
      },
      Lexeme::LineComment => {
        blank(&mut code, c);
        blank(&mut masked, c);
        if c == '\n' {
          state = Lexeme::Code;
        }
      }
      Lexeme::BlockComment => {
        blank(&mut code, c);
        blank(&mut masked, c);
        if c == '*' && chars.peek() == Some(&'/') {
          chars.next();
          code.push(' ');
          masked.push(' ');
          state = Lexeme::Code;
        }
      }
      Lexeme::Literal(quote) => {
        if c == quote || c == '\n' {
          code.push(c);
          masked.push(c);
          state = Lexeme::Code;
          continue;
        }
        code.push(c);
        blank(&mut masked, c);
        if c == '\\' {
          if let Some(escaped) = chars.next() {
            code.push(escaped);
            blank(&mut masked, escaped);
          }
        }
      }
    }
  }
  Masked { code, masked }
}

/// Lexical analyzer covering every import form and `pragma solidity` directive, ignoring
/// comments and the contents of string literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexAnalyzer;

impl SourceAnalyzer for RegexAnalyzer {
  fn analyze(&self, content: &str) -> Result<ParsedData, AnalyzerError> {
    let Masked { code, masked } = mask(content);
    let imports = IMPORT_PATH
      .captures_iter(&masked)
      .filter_map(|captures| captures.get(1))
      .map(|path| code[path.range()].to_owned())
      .collect();
    let version_pragmas = PRAGMA_SOLIDITY
      .captures_iter(&masked)
      .filter_map(|captures| captures.get(1))
      .map(|pragma| pragma.as_str().trim().to_owned())
      .collect();
    Ok(ParsedData {
      imports,
      version_pragmas,
    })
  }
}
