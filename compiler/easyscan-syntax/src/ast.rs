use easyscan_span::Span;

/// The top-level AST node representing a single Go source file.
///
/// Only the declaration level of the language is modeled. Function bodies, initializer
/// expressions, parameter lists and interface bodies are consumed by the parser but not kept, as
/// nothing downstream inspects them.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstSourceFile {
    pub span: Span,
    /// The comment group directly above the `package` clause.
    pub doc: Option<AstCommentGroup>,
    pub package: AstIdentifier,
    pub decls: Vec<AstDecl>,
    /// Every comment group in the file, in source order.
    pub comments: Vec<AstCommentGroup>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AstIdentifier {
    pub span: Span,
    pub name: String,
}

/// A single `//` or `/* */` comment, markers included in the text.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AstComment {
    pub span: Span,
    pub text: String,
}

/// A run of comments with no more than one line break between each of them.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AstCommentGroup {
    pub span: Span,
    pub comments: Vec<AstComment>,
}

/// A top-level declaration.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub enum AstDecl {
    Gen(AstGenDecl),
    Func(AstFuncDecl),
}

impl AstDecl {
    pub fn span(&self) -> &Span {
        match self {
            AstDecl::Gen(d) => &d.span,
            AstDecl::Func(d) => &d.span,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstGenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

/// A declaration group introduced by `import`, `const`, `type` or `var`.
///
/// A declaration without parentheses is a group with exactly one spec. Its doc comment belongs
/// to the group, never to the spec.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstGenDecl {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    pub kind: AstGenDeclKind,
    pub grouped: bool,
    pub specs: Vec<AstSpec>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub enum AstSpec {
    Import(AstImportSpec),
    Value(AstValueSpec),
    Type(AstTypeSpec),
}

impl AstSpec {
    pub fn span(&self) -> &Span {
        match self {
            AstSpec::Import(s) => &s.span,
            AstSpec::Value(s) => &s.span,
            AstSpec::Type(s) => &s.span,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstImportSpec {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    /// The local package name, `.` for dot imports.
    pub alias: Option<String>,
    pub path: AstStringLiteral,
}

/// A `const` or `var` spec. The initializer expressions are not kept.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstValueSpec {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    pub names: Vec<AstIdentifier>,
    pub ty: Option<AstType>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstTypeSpec {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    pub name: AstIdentifier,
    pub type_parameters: Vec<AstTypeParameter>,
    /// Whether this is an alias declaration, `type A = B`.
    pub alias: bool,
    pub ty: AstType,
}

/// One entry of a type parameter list, `K, V comparable`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstTypeParameter {
    pub span: Span,
    pub names: Vec<AstIdentifier>,
    pub constraint: Span,
}

/// A function or method declaration. Only the name survives parsing.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstFuncDecl {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    /// Span of the receiver list for methods.
    pub receiver: Option<Span>,
    pub name: AstIdentifier,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub enum AstType {
    Named(AstNamedType),
    Pointer(AstPointerType),
    Array(AstArrayType),
    Map(AstMapType),
    Chan(AstChanType),
    Func(AstFuncType),
    Struct(AstStructType),
    Interface(AstInterfaceType),
    Paren(AstParenType),
}

impl AstType {
    pub fn span(&self) -> &Span {
        match self {
            AstType::Named(t) => &t.span,
            AstType::Pointer(t) => &t.span,
            AstType::Array(t) => &t.span,
            AstType::Map(t) => &t.span,
            AstType::Chan(t) => &t.span,
            AstType::Func(t) => &t.span,
            AstType::Struct(t) => &t.span,
            AstType::Interface(t) => &t.span,
            AstType::Paren(t) => &t.span,
        }
    }
}

/// A type name, possibly qualified by a package and instantiated with type arguments.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstNamedType {
    pub span: Span,
    pub package: Option<AstIdentifier>,
    pub name: AstIdentifier,
    pub type_arguments: Vec<AstType>,
}

impl AstNamedType {
    /// Determine if this is a bare identifier, with neither package nor type arguments.
    pub fn is_plain_identifier(&self) -> bool {
        self.package.is_none() && self.type_arguments.is_empty()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstPointerType {
    pub span: Span,
    pub pointee: Box<AstType>,
}

/// An array or slice type. Slices have no length.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstArrayType {
    pub span: Span,
    /// Span of the length expression, `...` included.
    pub length: Option<Span>,
    pub element: Box<AstType>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstMapType {
    pub span: Span,
    pub key: Box<AstType>,
    pub value: Box<AstType>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstChanDirection {
    Both,
    Send,
    Receive,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstChanType {
    pub span: Span,
    pub direction: AstChanDirection,
    pub element: Box<AstType>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstFuncType {
    pub span: Span,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstStructType {
    pub span: Span,
    pub fields: Vec<AstField>,
}

/// A field slot of a struct type.
///
/// Embedded fields have no names. A slot such as `X, Y int` has several names sharing one type
/// and tag.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstField {
    pub span: Span,
    pub doc: Option<AstCommentGroup>,
    pub names: Vec<AstIdentifier>,
    pub ty: AstType,
    pub tag: Option<AstStringLiteral>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstInterfaceType {
    pub span: Span,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug)]
pub struct AstParenType {
    pub span: Span,
    pub inner: Box<AstType>,
}

/// A string literal as written in the source, quotes included.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AstStringLiteral {
    pub span: Span,
    pub raw: String,
}
