// Integration tests for the spec parser

use vsl_ir::ast::*;
use vsl_ir::error::ErrorKind;
use vsl_ir::parse;

fn shape(file: &SpecFile, idx: usize) -> &ShapeDecl {
    match &file.declarations[idx] {
        Declaration::Shape(s) => s,
        other => panic!("expected shape, got {other:?}"),
    }
}

fn endpoint(file: &SpecFile, idx: usize) -> &EndpointDecl {
    match &file.declarations[idx] {
        Declaration::Endpoint(e) => e,
        other => panic!("expected endpoint, got {other:?}"),
    }
}

fn field(member: &Member) -> &FieldDef {
    match member {
        Member::Field(f) => f,
        other => panic!("expected field, got {other:?}"),
    }
}

// Shapes

#[test]
fn test_parse_simple_shape() {
    let src = r#"
        Mood {
            _id string<isUnique|indexed>
            user_id string<indexed>
            emoji string
            ...common
        }
    "#;
    let file = parse(src).unwrap();
    assert!(file.imports.is_empty());
    let mood = shape(&file, 0);
    assert_eq!(mood.name, "Mood");
    assert_eq!(mood.members.len(), 4);

    let id = field(&mood.members[0]);
    assert_eq!(id.name, "_id");
    match &id.ty {
        TypeExpr::Named(t, _) => assert_eq!(t, "string"),
        _ => panic!("expected named type"),
    }
    let names: Vec<_> = id.annotations.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["isUnique", "indexed"]);

    match &mood.members[3] {
        Member::Spread(s) => assert_eq!(s.path, vec!["common"]),
        _ => panic!("expected spread"),
    }
}

#[test]
fn test_parse_imports() {
    let src = "import ../commons.go\nimport \"./shared/types.go\"\nA { x string }";
    let file = parse(src).unwrap();
    let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, vec!["../commons.go", "./shared/types.go"]);
    assert_eq!(file.imports[0].span.line, 1);
    assert_eq!(file.declarations.len(), 1);
}

#[test]
fn test_parse_cardinality() {
    let src = "A { a? string  b[] string  c[]? number }";
    let file = parse(src).unwrap();
    let a = shape(&file, 0);
    let flags: Vec<_> = a
        .members
        .iter()
        .map(|m| {
            let f = field(m);
            (f.name.as_str(), f.optional, f.array)
        })
        .collect();
    assert_eq!(
        flags,
        vec![("a", true, false), ("b", false, true), ("c", true, true)]
    );
}

#[test]
fn test_array_of_optional_rejected() {
    let err = parse("A { tags?[] string }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArrayOfOptional("tags".into()));
    assert_eq!(err.span.unwrap().col, 10);
}

#[test]
fn test_duplicate_marker_rejected() {
    let err = parse("A { x?? string }").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Duplicate(_)));
}

#[test]
fn test_parse_annotation_arguments() {
    let src = "User { site string<trim|startsWith:https://|!maxLength:80> }";
    let file = parse(src).unwrap();
    let site = field(&shape(&file, 0).members[0]);
    assert_eq!(site.annotations.len(), 3);
    assert_eq!(site.annotations[1].name, "startsWith");
    assert_eq!(site.annotations[1].arg.as_deref(), Some("https://"));
    assert!(site.annotations[2].negated);
    assert_eq!(site.annotations[2].arg.as_deref(), Some("80"));
    assert!(!site.annotations[0].negated);
    assert_eq!(site.annotations[0].arg, None);
}

#[test]
fn test_parse_enum_list() {
    let src = "Settings { theme string(light|dark)<trim> }";
    let file = parse(src).unwrap();
    let theme = field(&shape(&file, 0).members[0]);
    assert_eq!(theme.enum_values.as_ref().unwrap().values, vec!["light", "dark"]);
    assert_eq!(theme.annotations.len(), 1);
}

#[test]
fn test_enum_list_keeps_empty_entries() {
    let file = parse("A { x string(a||b) }").unwrap();
    let x = field(&shape(&file, 0).members[0]);
    assert_eq!(x.enum_values.as_ref().unwrap().values, vec!["a", "", "b"]);
    let file = parse("A { x string() }").unwrap();
    let x = field(&shape(&file, 0).members[0]);
    assert!(x.enum_values.as_ref().unwrap().values.is_empty());
}

#[test]
fn test_duplicate_annotation_group_rejected() {
    let err = parse("A { x string<trim><lowercase> }").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Duplicate(_)));
}

#[test]
fn test_parse_nested_objects() {
    let src = r#"
        Profile {
            settings {
                theme string(light|dark)
                notifications object {
                    email boolean
                    push? boolean
                }
            }
            images[] {
                url string
            }
        }
    "#;
    let file = parse(src).unwrap();
    let profile = shape(&file, 0);
    let settings = field(&profile.members[0]);
    let inner = match &settings.ty {
        TypeExpr::Inline(members, _) => members,
        _ => panic!("expected inline shape"),
    };
    assert_eq!(inner.len(), 2);
    match &field(&inner[1]).ty {
        TypeExpr::Inline(m, _) => assert_eq!(m.len(), 2),
        _ => panic!("expected nested inline shape"),
    }
    let images = field(&profile.members[1]);
    assert!(images.array);
    assert!(matches!(images.ty, TypeExpr::Inline(..)));
}

#[test]
fn test_inline_shape_needs_object_type() {
    let err = parse("A { x string { y string } }").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnexpectedToken { .. }));
}

#[test]
fn test_parse_path_spread() {
    let file = parse("Theme { ...Profile.settings.theme }").unwrap();
    match &shape(&file, 0).members[0] {
        Member::Spread(s) => {
            assert_eq!(s.path, vec!["Profile", "settings", "theme"]);
            assert_eq!(s.target(), "Profile");
        }
        _ => panic!("expected spread"),
    }
}

#[test]
fn test_parse_description_and_alias() {
    let src = "User {\n  email string<isEmail> as mail // Login address\n  name string\n}";
    let file = parse(src).unwrap();
    let user = shape(&file, 0);
    let email = field(&user.members[0]);
    assert_eq!(email.alias.as_deref(), Some("mail"));
    assert_eq!(email.description.as_deref(), Some("Login address"));
    let name = field(&user.members[1]);
    assert_eq!(name.alias, None);
    assert_eq!(name.description, None);
}

#[test]
fn test_leading_comment_is_not_description() {
    let src = "A {\n  // about x\n  x string\n}";
    let file = parse(src).unwrap();
    assert_eq!(field(&shape(&file, 0).members[0]).description, None);
}

// Endpoints

#[test]
fn test_parse_endpoint() {
    let src = r#"
        UpdateProfile {
            path /profiles/:id
            method PATCH
            params {
                id string
            }
            body {
                name? string<trim>
            }
            response.ok {
                http.code 200
                status successful
                message "Profile updated"
                data {
                    ...Profile
                }
            }
            response.notFound {
                http.code 404
                status "error"
                message "No such profile"
            }
        }
    "#;
    let file = parse(src).unwrap();
    let ep = endpoint(&file, 0);
    assert_eq!(ep.name, "UpdateProfile");
    assert_eq!(ep.path.as_ref().unwrap().0, "/profiles/:id");
    assert_eq!(ep.method.as_ref().unwrap().0, "PATCH");
    assert_eq!(ep.params.as_ref().unwrap().members.len(), 1);
    assert!(ep.query.is_none());
    assert_eq!(ep.body.as_ref().unwrap().members.len(), 1);
    assert_eq!(ep.responses.len(), 2);

    let ok = &ep.responses[0];
    assert_eq!(ok.tag, "ok");
    assert_eq!(ok.http_code.unwrap().0, 200);
    assert_eq!(ok.status.as_deref(), Some("successful"));
    assert_eq!(ok.message.as_deref(), Some("Profile updated"));
    assert!(matches!(ok.data[0], Member::Spread(_)));

    let not_found = &ep.responses[1];
    assert_eq!(not_found.status.as_deref(), Some("error"));
    assert!(not_found.data.is_empty());
}

#[test]
fn test_endpoint_rejects_plain_fields() {
    let src = "E { path /x\n method GET\n name string }";
    let err = parse(src).unwrap_err();
    match err.kind {
        ErrorKind::UnexpectedToken { found, .. } => assert_eq!(found, "field `name`"),
        other => panic!("expected UnexpectedToken, got {other:?}"),
    }
}

#[test]
fn test_endpoint_lowercase_method_rejected() {
    let err = parse("E { path /x\n method get }").unwrap_err();
    match err.kind {
        ErrorKind::UnexpectedToken { expected, found } => {
            assert_eq!(expected, "an uppercase HTTP method");
            assert_eq!(found, "get");
        }
        other => panic!("expected UnexpectedToken, got {other:?}"),
    }
}

#[test]
fn test_duplicate_response_tag_rejected() {
    let src = r#"
        E {
            path /x
            method GET
            response.ok { http.code 200 status ok message "a" }
            response.ok { http.code 201 status ok message "b" }
        }
    "#;
    let err = parse(src).unwrap_err();
    match err.kind {
        ErrorKind::Duplicate(what) => assert!(what.contains("response.ok")),
        other => panic!("expected Duplicate, got {other:?}"),
    }
}

#[test]
fn test_unknown_response_key() {
    let src = "E { path /x\n response.ok { code 200 } }";
    let err = parse(src).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnexpectedToken { .. }));
}

#[test]
fn test_path_field_in_shape_is_a_field() {
    let file = parse("File { path string\n method string }").unwrap();
    let f = shape(&file, 0);
    assert_eq!(f.members.len(), 2);
}

// Errors

#[test]
fn test_parse_error_location() {
    let err = parse("A {\n  x string\n  y\n}").unwrap_err();
    let span = err.span.unwrap();
    assert_eq!(span.line, 4);
    match err.kind {
        ErrorKind::UnexpectedToken { expected, found } => {
            assert_eq!(expected, "a type or `{`");
            assert_eq!(found, "`}`");
        }
        other => panic!("expected UnexpectedToken, got {other:?}"),
    }
}

#[test]
fn test_unclosed_block() {
    let err = parse("A { x string").unwrap_err();
    match err.kind {
        ErrorKind::UnexpectedToken { found, .. } => assert_eq!(found, "<eof>"),
        other => panic!("expected UnexpectedToken, got {other:?}"),
    }
}

#[test]
fn test_lex_error_surfaces() {
    let err = parse("A { x string<trim }").unwrap_err();
    assert!(err.kind.is_lex());
}
