//! Declaration extraction from Go packages.
//!
//! The extractor reads a single Go file or every Go file of a directory, parses them and walks the
//! declarations with a [`DeclarationVisitor`]. Type declarations selected by directive comments,
//! or every type declaration when all types are extracted, are turned into the structural model
//! in [`model`]: records for struct declarations and lists for array and slice declarations.
//!
//! A file that fails to read or parse aborts the whole input. Problems with single declarations
//! only drop the offending member or list and are reported as warnings next to the result.

use crate::error::{ExtractResult, ExtractWarning, SourceIoError, SourceSyntaxError};
use crate::model::DeclarationStore;
use crate::source::{package_files, SourceFile, SourceId, SourceSet};
use crate::visitor::{AstNode, DeclarationVisitor, ParsedFile, ParsedPackage};
use easyscan_syntax::{AstSourceFile, Lexer, Parser};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod directive;
pub mod error;
pub mod model;
pub mod source;
pub mod structure;
pub mod visitor;

/// Options for an extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Extract every struct and list declaration, not only the explicitly marked ones.
    pub all_types: bool,
}

/// The result of extracting declarations from one input path.
#[derive(Debug)]
pub struct Extraction {
    pub store: DeclarationStore,
    /// The files that were read. Diagnostics point into these.
    pub sources: SourceSet,
    pub diagnostics: Vec<ExtractWarning>,
}

pub struct DeclarationParser {
    options: ExtractOptions,
}

impl DeclarationParser {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Extract the declarations of a Go file, or of every Go file in a directory.
    pub fn parse_path(&self, path: &Path) -> ExtractResult<Extraction> {
        let metadata = fs::metadata(path).map_err(|error| SourceIoError {
            path: path.to_path_buf(),
            error,
        })?;
        if metadata.is_dir() {
            self.parse_dir(path)
        } else {
            self.parse_source(SourceFile::read(path)?)
        }
    }

    /// Extract the declarations of a single source file.
    ///
    /// The package directory is the directory containing the file.
    pub fn parse_source(&self, file: SourceFile) -> ExtractResult<Extraction> {
        let package_dir = match file.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut sources = SourceSet::default();
        let id = sources.add(file);
        let parsed = ParsedFile {
            source: id,
            ast: parse_source_file(&sources, id)?,
        };
        let mut visitor = DeclarationVisitor::new(
            &sources,
            DeclarationStore::new(package_dir),
            self.options.all_types,
        );
        visitor.visit(AstNode::File(&parsed));
        let (store, diagnostics) = visitor.finish();
        Ok(Extraction {
            store,
            sources,
            diagnostics,
        })
    }

    /// Extract the declarations of every Go file directly inside `dir`.
    ///
    /// Test files are left out. All files are parsed before any declaration is extracted, so a
    /// single malformed file yields no declarations at all. Files are grouped by the package they
    /// declare and the packages are walked in name order.
    pub fn parse_dir(&self, dir: &Path) -> ExtractResult<Extraction> {
        let mut sources = SourceSet::default();
        for path in package_files(dir)? {
            sources.add(SourceFile::read(&path)?);
        }
        let mut packages: BTreeMap<String, ParsedPackage> = BTreeMap::new();
        for (id, _) in sources.iter() {
            let ast = parse_source_file(&sources, id)?;
            packages
                .entry(ast.package.name.clone())
                .or_insert_with_key(|name| ParsedPackage {
                    name: name.clone(),
                    files: Vec::new(),
                })
                .files
                .push(ParsedFile { source: id, ast });
        }
        if packages.len() > 1 {
            let names = packages.keys().cloned().collect::<Vec<_>>().join(", ");
            log::warn!("{} declares several packages: {names}", dir.display());
        }
        let mut visitor = DeclarationVisitor::new(
            &sources,
            DeclarationStore::new(dir),
            self.options.all_types,
        );
        for package in packages.values() {
            visitor.visit(AstNode::Package(package));
        }
        let (store, diagnostics) = visitor.finish();
        Ok(Extraction {
            store,
            sources,
            diagnostics,
        })
    }
}

fn parse_source_file(sources: &SourceSet, id: SourceId) -> ExtractResult<AstSourceFile> {
    let source = sources.get(id);
    let mut lexer = Lexer::new(&source.text);
    let mut parser = Parser::new(&mut lexer);
    let file = parser.parse().map_err(|error| SourceSyntaxError {
        path: source.path.clone(),
        source_code: source.named_source(),
        span: *error.span(),
        error,
    })?;
    log::debug!(
        "parsed {} with {} declarations",
        source.path.display(),
        file.decls.len()
    );
    Ok(file)
}
