use crate::directive::DirectiveState;
use crate::error::{ExtractWarning, UnnamedFieldWarning, UnresolvedElementWarning};
use crate::model::DeclarationStore;
use crate::source::{SourceId, SourceSet};
use crate::structure::{extract_list, extract_record};
use easyscan_diagnostics::ice;
use easyscan_syntax::{
    AstCommentGroup, AstDecl, AstGenDecl, AstGenDeclKind, AstSourceFile, AstSpec, AstType,
    AstTypeSpec, FileScope,
};

/// A parsed source file and the handle of its text.
#[derive(Debug)]
pub struct ParsedFile {
    pub source: SourceId,
    pub ast: AstSourceFile,
}

/// The files of a directory declaring the same package, in file name order.
#[derive(Debug)]
pub struct ParsedPackage {
    pub name: String,
    pub files: Vec<ParsedFile>,
}

/// The nodes the declaration visitor descends through.
#[derive(Debug, Clone, Copy)]
pub enum AstNode<'ast> {
    Package(&'ast ParsedPackage),
    File(&'ast ParsedFile),
    DeclGroup(&'ast AstGenDecl),
    CommentGroup(&'ast AstCommentGroup),
    TypeSpec(&'ast AstTypeSpec),
}

/// State of the file currently being walked.
struct FileContext<'ast> {
    source: SourceId,
    scope: FileScope<'ast>,
}

/// Depth-first walk collecting the declarations selected by directive comments.
///
/// Comment groups are visited in source order on the way down, so the directives in front of a
/// type declaration are absorbed right before the declaration itself. Besides the doc comment of
/// the type declaration, this includes the doc comments of earlier declaration groups that had no
/// type declaration to consume them, such as the doc comment of a `var` group.
pub struct DeclarationVisitor<'ast, 'a> {
    sources: &'a SourceSet,
    store: DeclarationStore,
    diagnostics: Vec<ExtractWarning>,
    all_types: bool,
    directives: DirectiveState,
    file: Option<FileContext<'ast>>,
}

impl<'ast, 'a> DeclarationVisitor<'ast, 'a> {
    pub fn new(sources: &'a SourceSet, store: DeclarationStore, all_types: bool) -> Self {
        Self {
            sources,
            store,
            diagnostics: Vec::new(),
            all_types,
            directives: DirectiveState::default(),
            file: None,
        }
    }

    /// Consume the visitor, yielding the collected declarations and diagnostics.
    pub fn finish(self) -> (DeclarationStore, Vec<ExtractWarning>) {
        (self.store, self.diagnostics)
    }

    pub fn visit(&mut self, node: AstNode<'ast>) {
        match node {
            AstNode::Package(package) => {
                self.directives.reset();
                for file in &package.files {
                    self.visit(AstNode::File(file));
                }
            }
            AstNode::File(file) => self.visit_file(file),
            AstNode::DeclGroup(group) => self.visit_decl_group(group),
            AstNode::CommentGroup(group) => self.directives.absorb_group(group),
            AstNode::TypeSpec(spec) => {
                self.visit_type_spec(spec);
                self.directives.reset();
            }
        }
    }

    fn visit_file(&mut self, file: &'ast ParsedFile) {
        let name = file.ast.package.name.as_str();
        if let Some(previous) = self.store.set_package_name(name) {
            log::warn!(
                "package name changed from {previous} to {name} in {}",
                self.sources.get(file.source).path.display()
            );
        }
        self.file = Some(FileContext {
            source: file.source,
            scope: file.ast.scope(),
        });
        if let Some(doc) = &file.ast.doc {
            self.visit(AstNode::CommentGroup(doc));
        }
        for decl in &file.ast.decls {
            // Function declarations carry neither directives nor type declarations.
            if let AstDecl::Gen(group) = decl {
                self.visit(AstNode::DeclGroup(group));
            }
        }
        self.file = None;
    }

    fn visit_decl_group(&mut self, group: &'ast AstGenDecl) {
        if let Some(doc) = &group.doc {
            self.visit(AstNode::CommentGroup(doc));
        }
        if group.kind != AstGenDeclKind::Type {
            return;
        }
        for spec in &group.specs {
            if let AstSpec::Type(spec) = spec {
                if let Some(doc) = &spec.doc {
                    self.visit(AstNode::CommentGroup(doc));
                }
                self.visit(AstNode::TypeSpec(spec));
            }
        }
    }

    fn visit_type_spec(&mut self, spec: &'ast AstTypeSpec) {
        let name = spec.name.name.as_str();
        if self.directives.skip {
            log::debug!("skipping {name}");
            return;
        }
        if !self.directives.explicit && !self.all_types {
            return;
        }
        let Some(context) = self.file.as_ref() else {
            ice!("type declaration visited outside of a source file")
        };
        let source = context.source;
        match &spec.ty {
            AstType::Struct(ty) => {
                let extraction = extract_record(name, ty);
                for span in extraction.unnamed {
                    let warning = UnnamedFieldWarning {
                        record: name.to_owned(),
                        source_code: self.sources.get(source).named_source(),
                        span,
                    };
                    self.report(warning.into());
                }
                log::debug!(
                    "extracted record {name} with {} fields",
                    extraction.record.fields.len()
                );
                self.store.add_record(extraction.record);
            }
            AstType::Array(ty) => match extract_list(spec, ty, &context.scope) {
                Ok(list) => {
                    log::debug!("extracted list {name} of {}", list.element_name);
                    self.store.add_list(list);
                }
                Err(unresolved) => {
                    let warning = UnresolvedElementWarning {
                        list: name.to_owned(),
                        reason: unresolved.reason.to_string(),
                        source_code: self.sources.get(source).named_source(),
                        span: unresolved.span,
                    };
                    self.report(warning.into());
                }
            },
            _ => {}
        }
    }

    /// Keep a warning for the caller to render.
    fn report(&mut self, warning: ExtractWarning) {
        log::debug!("{warning}");
        self.diagnostics.push(warning);
    }
}
