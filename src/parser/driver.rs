//! Top-level document driver: alternates between template text and script
//! regions, each already delimited by the lexer's `DelimStart*`/`DelimEnd`
//! tokens, and assembles the flat [`Program`]. Ported in behavior from
//! `ast_types/parser.py`'s `parse_program`/`parse_output_text` top-level
//! loop — collapsed here into a dispatch on the current token's kind
//! rather than an explicit mode flag, since the lexer already encodes the
//! mode boundary in the token stream.

use crate::ast::classify::promote_program;
use crate::ast::{IncludeFile, IncludeType, OutputDirective, OutputText, Program, ProcessingDirective, ProcessingSetting, TopLevelItem};
use crate::diagnostics::{Diagnostics, DiagnosticKind};
use crate::error::ParserError;
use crate::lexer::tokenize;
use crate::token::TokenKind;

use super::cursor::TokenCursor;

/// Resolves an `#include` directive's target to source text. File-inclusion
/// resolution itself is out of scope for this front-end (spec §9): the
/// parser never calls `resolve` to stitch content into the tree, it only
/// exists as an extension point for a downstream consumer. Every
/// `IncludeFile` node the parser produces is reported as
/// [`DiagnosticKind::UnresolvedInclude`] unconditionally.
pub trait IncludeResolver {
    fn resolve(&mut self, include_type: IncludeType, path: &str) -> Option<String>;
}

/// The default resolver: never resolves anything (spec §4.8).
#[derive(Debug, Default)]
pub struct NullResolver;

impl IncludeResolver for NullResolver {
    fn resolve(&mut self, _include_type: IncludeType, _path: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParserSettings {
    /// Recursion guard for `parser::expr` (spec §4.3's depth limit).
    pub max_expr_depth: u32,
    /// Recursion guard for nested block statements (spec §4.5).
    pub max_block_depth: u32,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            max_expr_depth: 200,
            max_block_depth: 64,
        }
    }
}

pub fn parse_program(source: &str) -> Result<(Program, Diagnostics), ParserError> {
    parse_program_with(source, ParserSettings::default())
}

pub fn parse_program_with(source: &str, settings: ParserSettings) -> Result<(Program, Diagnostics), ParserError> {
    let tokens = tokenize(source)?;
    let mut cur = TokenCursor::new(&tokens, source);
    cur.set_max_expr_depth(settings.max_expr_depth);
    let mut diagnostics = Diagnostics::new();
    let mut items = Vec::new();
    let mut seen_non_processing = false;

    while !cur.at_end() {
        match cur.current().map(|t| t.kind) {
            Some(TokenKind::DelimStartProcessing) => {
                if seen_non_processing {
                    return Err(ParserError::Grammar {
                        pos: cur.current_pos(),
                        message: "a processing directive must be the first thing in the document".to_string(),
                    });
                }
                items.push(TopLevelItem::Processing(parse_processing_directive(&mut cur)?));
            }
            Some(TokenKind::FileText) | Some(TokenKind::DelimStartOutput) | Some(TokenKind::HtmlStartComment) => {
                seen_non_processing = true;
                scan_nonscript_into(&mut cur, &mut diagnostics, &mut items, TopLevelItem::Output, TopLevelItem::Include)?;
            }
            Some(TokenKind::DelimStartScript) => {
                seen_non_processing = true;
                cur.advance();
                for stmt in super::stmt::parse_global_stmt_list(&mut cur, &mut diagnostics, settings, 0)? {
                    items.push(TopLevelItem::Global(stmt));
                }
                if cur.at_end() {
                    return Err(ParserError::UnexpectedEof {
                        pos: cur.current_pos(),
                        expected: "'%>' closing the script block",
                    });
                }
                cur.advance(); // DelimEnd
            }
            _ => return Err(cur.unexpected("template text, a processing directive, or a script block")),
        }
    }

    let mut program = Program { items };
    promote_program(&mut program)?;
    Ok((program, diagnostics))
}

fn parse_processing_directive(cur: &mut TokenCursor<'_>) -> Result<ProcessingDirective, ParserError> {
    cur.assert_consume_kind(TokenKind::DelimStartProcessing, "'<%@'")?;
    let mut settings = Vec::new();
    while !cur.try_kind(TokenKind::DelimEnd) && !cur.at_end() {
        let key = cur.assert_consume_kind(TokenKind::Identifier, "a setting name")?.clone();
        cur.assert_consume_symbol("=")?;
        let value = cur.assert_consume_kind(TokenKind::LiteralString, "a quoted setting value")?.clone();
        settings.push(ProcessingSetting { key, value });
    }
    cur.assert_consume_kind(TokenKind::DelimEnd, "'%>' closing the processing directive")?;
    Ok(ProcessingDirective { settings })
}

fn parse_include_comment(cur: &mut TokenCursor<'_>) -> Result<IncludeFile, ParserError> {
    cur.assert_consume_kind(TokenKind::HtmlStartComment, "'<!--'")?;
    cur.assert_consume_kind(TokenKind::IncludeKw, "'#include'")?;
    let ty_tok = cur.assert_consume_kind(TokenKind::IncludeType, "'file' or 'virtual'")?;
    let include_type = if ty_tok.text(cur.source()).eq_ignore_ascii_case("virtual") {
        IncludeType::Virtual
    } else {
        IncludeType::File
    };
    let path_tok = cur.assert_consume_kind(TokenKind::IncludePath, "an include path")?.clone();
    cur.assert_consume_kind(TokenKind::HtmlEndComment, "'-->'")?;
    Ok(IncludeFile {
        include_type,
        include_path: path_tok,
    })
}

/// Reads a run of interleaved template text, `<%= %>` output directives and
/// `#include` comments — everything that can appear between two script
/// regions — stopping at the next `<%`/`<%@` or end of input. Shared
/// between the top-level driver and `parser::stmt`'s block-statement loop
/// (the reference's `NonscriptBlock`), since both need the identical scan,
/// only differing in which enum they wrap the results in.
pub(super) fn scan_nonscript_into<T>(
    cur: &mut TokenCursor<'_>,
    diagnostics: &mut Diagnostics,
    out: &mut Vec<T>,
    wrap_output: impl Fn(OutputText) -> T,
    wrap_include: impl Fn(IncludeFile) -> T,
) -> Result<(), ParserError> {
    let mut pending = OutputText::new();
    loop {
        match cur.current().map(|t| t.kind) {
            Some(TokenKind::FileText) => {
                let tok = cur.advance().expect("matched FileText above").clone();
                pending.push_raw(tok);
            }
            Some(TokenKind::DelimStartOutput) => {
                cur.advance();
                let expr = super::expr::parse_expr(cur)?;
                cur.assert_consume_kind(TokenKind::DelimEnd, "'%>' closing an output directive")?;
                pending.push_directive(OutputDirective { output_expr: expr });
            }
            Some(TokenKind::HtmlStartComment) => {
                let include = parse_include_comment(cur)?;
                if !pending.is_empty() {
                    out.push(wrap_output(std::mem::take(&mut pending)));
                }
                diagnostics.push(
                    include.include_path.pos,
                    DiagnosticKind::UnresolvedInclude,
                    format!("include target '{}' was not resolved", include.include_path.text(cur.source())),
                );
                out.push(wrap_include(include));
            }
            _ => break,
        }
    }
    if !pending.is_empty() {
        out.push(wrap_output(pending));
    }
    Ok(())
}
