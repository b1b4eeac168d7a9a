//! Top-level constructs that sit alongside plain VBScript statements:
//! processing directives, include directives, and interleaved template
//! text. Ported from `ast_types/special.py`.

use crate::ast::expr::Expr;
use crate::token::Token;

/// One `key=value` pair inside a `<%@ ... %>` processing directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSetting {
    pub key: Token,
    pub value: Token,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingDirective {
    pub settings: Vec<ProcessingSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeType {
    File,
    Virtual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncludeFile {
    pub include_type: IncludeType,
    pub include_path: Token,
}

/// `<%= expr %>`: an expression written directly to the response.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDirective {
    pub output_expr: Expr,
}

/// Which list a `stitch_order` entry indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Raw,
    Directive,
}

/// One element reconstructed by [`OutputText::stitch`]: either a raw
/// chunk of template text or an evaluated output directive.
#[derive(Debug, Clone, PartialEq)]
pub enum StitchedItem<'a> {
    Raw(&'a Token),
    Directive(&'a OutputDirective),
}

/// A run of interleaved raw template text and `<%= %>` output directives,
/// between two script-mode boundaries. `stitch_order` records which list
/// (`chunks` or `directives`) each element came from and in what order,
/// so the original interleaving can be reconstructed (spec §3, §4.6).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputText {
    pub chunks: Vec<Token>,
    pub directives: Vec<OutputDirective>,
    pub stitch_order: Vec<(OutputType, usize)>,
}

impl OutputText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&mut self, chunk: Token) {
        let idx = self.chunks.len();
        self.chunks.push(chunk);
        self.stitch_order.push((OutputType::Raw, idx));
    }

    pub fn push_directive(&mut self, directive: OutputDirective) {
        let idx = self.directives.len();
        self.directives.push(directive);
        self.stitch_order.push((OutputType::Directive, idx));
    }

    pub fn is_empty(&self) -> bool {
        self.stitch_order.is_empty()
    }

    /// Combines `self` with `other`, concatenating their element lists and
    /// re-offsetting `other`'s `stitch_order` indices so the combined
    /// order still reconstructs correctly (spec §4.5, §8).
    pub fn merge(&self, other: &OutputText) -> OutputText {
        let num_chunks = self.chunks.len();
        let num_directives = self.directives.len();

        let mut chunks = self.chunks.clone();
        chunks.extend(other.chunks.iter().cloned());
        let mut directives = self.directives.clone();
        directives.extend(other.directives.iter().cloned());

        let mut stitch_order = self.stitch_order.clone();
        stitch_order.extend(other.stitch_order.iter().map(|&(ty, idx)| {
            let offset = match ty {
                OutputType::Raw => num_chunks,
                OutputType::Directive => num_directives,
            };
            (ty, idx + offset)
        }));

        OutputText {
            chunks,
            directives,
            stitch_order,
        }
    }

    /// Reconstructs the original interleaving of chunks and directives.
    pub fn stitch(&self) -> impl Iterator<Item = StitchedItem<'_>> {
        self.stitch_order.iter().map(move |&(ty, idx)| match ty {
            OutputType::Raw => StitchedItem::Raw(&self.chunks[idx]),
            OutputType::Directive => StitchedItem::Directive(&self.directives[idx]),
        })
    }
}
