use easyscan_syntax::{AstDecl, AstSourceFile, AstSpec, FileScope, Lexer, Parser};

/// Names of all type declarations in the file, in source order.
fn declared_types(file: &AstSourceFile) -> Vec<&str> {
    file.decls
        .iter()
        .filter_map(|decl| match decl {
            AstDecl::Gen(group) => Some(group),
            AstDecl::Func(_) => None,
        })
        .flat_map(|group| group.specs.iter())
        .filter_map(|spec| match spec {
            AstSpec::Type(ty) => Some(ty.name.name.as_str()),
            _ => None,
        })
        .collect()
}

/// Every corpus file opens with a `// types: A B C` line naming the type declarations it holds.
#[test]
fn test_corpus_parses() {
    insta::glob!("data/*.go", |path| {
        let input = std::fs::read_to_string(path).unwrap();
        let expected = input
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("// types:"))
            .expect("corpus file is missing its types header")
            .split_whitespace()
            .collect::<Vec<_>>();
        let mut lexer = Lexer::new(&input);
        let mut parser = Parser::new(&mut lexer);
        let file = parser
            .parse()
            .expect("failed to parse corpus file into ast");
        assert_eq!(declared_types(&file), expected, "{}", path.display());
        let scope = FileScope::new(&file);
        for name in expected {
            assert!(scope.declares(name), "{name} missing from file scope");
        }
    })
}
