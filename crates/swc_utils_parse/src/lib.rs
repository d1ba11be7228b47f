use std::path::{Path, PathBuf};

use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceFile, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{file}:{line}:{col} :: {message}")]
    Syntax {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },
}

/// Picks the parser syntax for a file from its extension.
///
/// JavaScript flavours are parsed with the TypeScript grammar, which accepts
/// them as-is. JSX is allowed in every JavaScript file, as tsc does.
pub fn syntax_for_name(file_name: &str) -> Syntax {
    let dts = file_name.ends_with(".d.ts")
        || file_name.ends_with(".d.mts")
        || file_name.ends_with(".d.cts");
    let javascript = [".js", ".jsx", ".mjs", ".cjs"]
        .iter()
        .any(|ext| file_name.ends_with(ext));
    Syntax::Typescript(TsSyntax {
        tsx: file_name.ends_with(".tsx") || javascript,
        decorators: true,
        dts,
        ..Default::default()
    })
}

pub fn create_lexer<'a>(fm: &'a SourceFile, comments: Option<&'a dyn Comments>) -> Lexer<'a> {
    let filename = fm.name.to_string();
    Lexer::new(
        syntax_for_name(&filename),
        Default::default(),
        StringInput::from(fm),
        comments,
    )
}

/// A parsed module along with everything needed to map spans back to the
/// original text.
pub struct ParsedSource {
    pub source_map: Lrc<SourceMap>,
    pub source_file: Lrc<SourceFile>,
    pub module: Module,
    pub comments: SingleThreadedComments,
    /// Diagnostics the parser recovered from
    pub recovered_errors: Vec<(swc_common::Span, String)>,
}

impl ParsedSource {
    /// 1-based line number of a position in this file.
    pub fn line_of(&self, pos: BytePos) -> u32 {
        self.source_map.lookup_char_pos(pos).line as u32
    }

    /// Byte offset of a position into [SourceFile::src].
    pub fn offset_of(&self, pos: BytePos) -> usize {
        (pos.0 - self.source_file.start_pos.0) as usize
    }

    pub fn src(&self) -> &str {
        &self.source_file.src
    }
}

/// Reads and parses a source file from disk.
pub fn parse_file(path: &Path) -> Result<ParsedSource, ParseError> {
    let body = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(FileName::Real(path.to_path_buf()), body)
}

/// Parses an in-memory module. Used for sources that never touch disk.
pub fn parse_ecma_src<TName, TBody>(name_str: TName, body: TBody) -> Result<ParsedSource, ParseError>
where
    TName: Into<String>,
    TBody: ToString,
{
    parse_source(FileName::Custom(name_str.into()), body.to_string())
}

fn parse_source(file_name: FileName, body: String) -> Result<ParsedSource, ParseError> {
    let cm = Lrc::<SourceMap>::default();
    let fm = cm.new_source_file(Lrc::new(file_name), body);
    let comments = SingleThreadedComments::default();

    let (module, errors) = {
        let lexer = create_lexer(&fm, Some(&comments));
        let mut parser = Parser::new_from(lexer);
        let parsed = parser.parse_typescript_module();
        (parsed, parser.take_errors())
    };

    let module = module.map_err(|err| {
        let loc = cm.lookup_char_pos(err.span().lo);
        ParseError::Syntax {
            file: fm.name.to_string(),
            line: loc.line,
            col: loc.col_display,
            message: err.kind().msg().to_string(),
        }
    })?;

    Ok(ParsedSource {
        source_map: cm,
        source_file: fm,
        module,
        comments,
        recovered_errors: errors
            .into_iter()
            .map(|err| (err.span(), err.kind().msg().to_string()))
            .collect(),
    })
}
