//! Integration tests for end-to-end template parsing.
//!
//! These tests drive the public `parse` entry point from source text to
//! the rendered tree set, covering accepted templates, rejected ones and
//! the exact diagnostics reported for common mistakes.

use gotmpl::{
    ast::ast::{is_empty_tree, Node, NodeType},
    parse, FuncMap, Mode, TreeSet,
};
use rstest::rstest;

fn builtins() -> Vec<FuncMap> {
    vec![FuncMap::from_names(["printf", "contains"])]
}

fn parse_main(text: &str) -> Result<TreeSet, gotmpl::errors::errors::Error> {
    parse("test", text, "", "", &builtins(), Mode::default())
}

fn render_main(text: &str, quote_text: bool) -> String {
    let set = parse_main(text).unwrap_or_else(|err| panic!("{:?}: {}", text, err));
    set["test"].render(quote_text)
}

#[rstest]
#[case::empty("", "")]
#[case::comment("{{/*\n\n\n*/}}", "")]
#[case::spaces(" \t\n", "\" \\t\\n\"")]
#[case::text("some text", "\"some text\"")]
#[case::field("{{.X}}", "{{.X}}")]
#[case::simple_command("{{printf}}", "{{printf}}")]
#[case::dollar_invocation("{{$}}", "{{$}}")]
#[case::variable_invocation("{{with $x := 3}}{{$x 23}}{{end}}", "{{with $x := 3}}{{$x 23}}{{end}}")]
#[case::variable_with_fields("{{$.I}}", "{{$.I}}")]
#[case::multi_word_command("{{printf `%d` 23}}", "{{printf `%d` 23}}")]
#[case::pipeline("{{.X|.Y}}", "{{.X | .Y}}")]
#[case::pipeline_with_decl("{{$x := .X|.Y}}", "{{$x := .X | .Y}}")]
#[case::nested_pipeline("{{.X (.Y .Z) (.A | .B .C) (.E)}}", "{{.X (.Y .Z) (.A | .B .C) (.E)}}")]
#[case::field_of_parentheses("{{(.Y .Z).Field}}", "{{(.Y .Z).Field}}")]
#[case::simple_if("{{if .X}}hello{{end}}", "{{if .X}}\"hello\"{{end}}")]
#[case::if_with_else("{{if .X}}true{{else}}false{{end}}", "{{if .X}}\"true\"{{else}}\"false\"{{end}}")]
#[case::if_with_else_if(
    "{{if .X}}true{{else if .Y}}false{{end}}",
    "{{if .X}}\"true\"{{else}}{{if .Y}}\"false\"{{end}}{{end}}"
)]
#[case::if_else_chain(
    "+{{if .X}}X{{else if .Y}}Y{{else if .Z}}Z{{end}}+",
    "\"+\"{{if .X}}\"X\"{{else}}{{if .Y}}\"Y\"{{else}}{{if .Z}}\"Z\"{{end}}{{end}}{{end}}\"+\""
)]
#[case::simple_range("{{range .X}}hello{{end}}", "{{range .X}}\"hello\"{{end}}")]
#[case::chained_field_range("{{range .X.Y.Z}}hello{{end}}", "{{range .X.Y.Z}}\"hello\"{{end}}")]
#[case::nested_range(
    "{{range .X}}hello{{range .Y}}goodbye{{end}}{{end}}",
    "{{range .X}}\"hello\"{{range .Y}}\"goodbye\"{{end}}{{end}}"
)]
#[case::range_with_else("{{range .X}}true{{else}}false{{end}}", "{{range .X}}\"true\"{{else}}\"false\"{{end}}")]
#[case::range_over_pipeline(
    "{{range .X|.M}}true{{else}}false{{end}}",
    "{{range .X | .M}}\"true\"{{else}}\"false\"{{end}}"
)]
#[case::range_one_var("{{range $x := .SI}}{{.}}{{end}}", "{{range $x := .SI}}{{.}}{{end}}")]
#[case::range_two_vars("{{range $x, $y := .SI}}{{.}}{{end}}", "{{range $x, $y := .SI}}{{.}}{{end}}")]
#[case::range_with_break("{{range .SI}}{{.}}{{break}}{{end}}", "{{range .SI}}{{.}}{{break}}{{end}}")]
#[case::range_with_continue("{{range .SI}}{{.}}{{continue}}{{end}}", "{{range .SI}}{{.}}{{continue}}{{end}}")]
#[case::constants(
    "{{range .SI 1 -3.2i true false 'a' nil}}{{end}}",
    "{{range .SI 1 -3.2i true false 'a' nil}}{{end}}"
)]
#[case::template("{{template `x`}}", "{{template \"x\"}}")]
#[case::template_with_arg("{{template `x` .Y}}", "{{template \"x\" .Y}}")]
#[case::with("{{with .X}}hello{{end}}", "{{with .X}}\"hello\"{{end}}")]
#[case::with_with_else("{{with .X}}hello{{else}}goodbye{{end}}", "{{with .X}}\"hello\"{{else}}\"goodbye\"{{end}}")]
#[case::with_with_else_with(
    "{{with .X}}hello{{else with .Y}}goodbye{{end}}",
    "{{with .X}}\"hello\"{{else}}{{with .Y}}\"goodbye\"{{end}}{{end}}"
)]
#[case::trim_left("x \r\n\t{{- 3}}", "\"x\"{{3}}")]
#[case::trim_right("{{3 -}}\n\n\ty", "{{3}}\"y\"")]
#[case::trim_left_and_right("x \r\n\t{{- 3 -}}\n\n\ty", "\"x\"{{3}}\"y\"")]
#[case::trim_with_extra_spaces("x\n{{-  3   -}}\ny", "\"x\"{{3}}\"y\"")]
#[case::comment_trim_left("x \r\n\t{{- /* hi */}}", "\"x\"")]
#[case::comment_trim_right("{{/* hi */ -}}\n\n\ty", "\"y\"")]
#[case::comment_trim_left_and_right("x \r\n\t{{- /* */ -}}\n\n\ty", "\"x\"\"y\"")]
#[case::block_definition("{{block \"foo\" .}}hello{{end}}", "{{template \"foo\" .}}")]
#[case::newline_in_assignment("{{ $x \n := \n 1 \n }}", "{{$x := 1}}")]
#[case::newline_in_pipeline("{{\n\"x\"\n|\nprintf\n}}", "{{\"x\" | printf}}")]
#[case::newline_in_comment("{{/*\nhello\n*/}}", "")]
#[case::newline_in_trimmed_comment("{{- /*\nhello\n*/ -}}", "")]
#[case::spaces_around_continue("{{range .SI}}{{.}}{{ continue }}{{end}}", "{{range .SI}}{{.}}{{continue}}{{end}}")]
#[case::declare_then_use("{{$x := 0}}{{$x}}", "{{$x := 0}}{{$x}}")]
#[case::redeclare("{{$x := 1}}{{$x := 2}}{{$x}}", "{{$x := 1}}{{$x := 2}}{{$x}}")]
#[case::signed_argument("{{$x:=.}}{{$x +2}}", "{{$x := .}}{{$x +2}}")]
#[case::range_declare("{{range $x := 0}}{{$x}}{{end}}", "{{range $x := 0}}{{$x}}{{end}}")]
#[case::range_assign("{{range $x = 0}}{{$x}}{{end}}", "{{range $x = 0}}{{$x}}{{end}}")]
fn test_parse_renders(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(render_main(input, true), expected);
}

#[rstest]
#[case::empty_action("{{}}")]
#[case::unmatched_end("{{end}}")]
#[case::unmatched_else("{{else}}")]
#[case::multiple_else("{{if .X}}1{{else}}2{{else}}3{{end}}")]
#[case::missing_end("hello{{range .x}}")]
#[case::missing_end_after_else("hello{{range .x}}{{else}}")]
#[case::undefined_function("hello{{undefined}}")]
#[case::undefined_variable("{{$x}}")]
#[case::variable_undefined_after_end("{{with $x := 4}}{{end}}{{$x}}")]
#[case::variable_undefined_in_template("{{template $v}}")]
#[case::declare_with_field("{{with $x.Y := 4}}{{end}}")]
#[case::template_with_field_ref("{{template .X}}")]
#[case::template_with_var("{{template $v}}")]
#[case::invalid_punctuation("{{printf 3, 4}}")]
#[case::multidecl_outside_range("{{with $v, $u := 3}}{{end}}")]
#[case::too_many_decls_in_range("{{range $u, $v, $w := 3}}{{end}}")]
#[case::dot_applied_to_parentheses("{{printf (printf .).}}")]
#[case::adjacent_args("{{printf 3`x`}}")]
#[case::adjacent_args_with_dot("{{printf `x`.}}")]
#[case::extra_end_after_if("{{if .X}}a{{else if .Y}}b{{end}}{{end}}")]
#[case::break_outside_range("{{range .}}{{end}} {{break}}")]
#[case::continue_outside_range("{{range .}}{{end}} {{continue}}")]
#[case::break_in_range_else("{{range .}}{{else}}{{break}}{{end}}")]
#[case::continue_in_range_else("{{range .}}{{else}}{{continue}}{{end}}")]
#[case::dot_after_float("{{1.E}}")]
#[case::dot_after_float_field("{{0.1.E}}")]
#[case::dot_after_dot("{{..E}}")]
#[case::dot_after_nil("{{nil.E}}")]
#[case::wrong_pipeline_dot("{{12|.}}")]
#[case::wrong_pipeline_number("{{.|12|printf}}")]
#[case::wrong_pipeline_string("{{.|printf|\"error\"}}")]
#[case::wrong_pipeline_bool("{{.|printf|true}}")]
#[case::wrong_pipeline_nil("{{.|printf|nil}}")]
#[case::empty_pipeline("{{printf \"%d\" ( ) }}")]
#[case::block_without_pipeline("{{block \"foo\"}}hello{{end}}")]
#[case::newline_in_empty_action("{{\n}}")]
#[case::compound_assign("{{$x += 1}}{{$x}}")]
#[case::bang_operator("{{$x ! 2}}{{$x}}")]
#[case::percent_operator("{{$x % 3}}{{$x}}")]
#[case::chained_declaration("{{range $x := $y := 3}}{{end}}")]
#[case::bang_after_variable("{{$x:=.}}{{$x!2}}")]
#[case::plus_after_variable("{{$x:=.}}{{$x+2}}")]
fn test_parse_rejects(#[case] input: &str) {
    assert!(parse_main(input).is_err(), "expected {:?} to fail", input);
}

#[rstest]
#[case::unclosed1("unclosed1", "line1\n{{", "unclosed1:2: unclosed action")]
#[case::unclosed2("unclosed2", "line1\n{{define `x`}}line2\n{{", "unclosed2:3: unclosed action")]
#[case::unclosed3("unclosed3", "line1\n{{\"x\"\n\"y\"\n", "unclosed3:4: unclosed action started at unclosed3:2")]
#[case::unclosed4("unclosed4", "{{\n\n\n\n\n", "unclosed4:6: unclosed action started at unclosed4:1")]
#[case::var1("var1", "line1\n{{\nx\n}}", "var1:3: function \"x\" not defined")]
#[case::function("function", "{{foo}}", "function \"foo\" not defined")]
#[case::comment1("comment1", "{{/*}}", "comment1:1: unclosed comment")]
#[case::comment2("comment2", "{{/*\nhello\n}}", "comment2:1: unclosed comment")]
#[case::lparen("lparen", "{{.X (1 2 3}}", "unclosed left paren")]
#[case::rparen("rparen", "{{.X 1 2 3 ) }}", "unexpected right paren")]
#[case::rparen2("rparen2", "{{(.X 1 2 3", "unclosed action")]
#[case::space("space", "{{`x`3}}", "in operand")]
#[case::idchar("idchar", "{{a#}}", "'#'")]
#[case::charconst("charconst", "{{'a}}", "unterminated character constant")]
#[case::stringconst("stringconst", "{{\"a}}", "unterminated quoted string")]
#[case::rawstringconst("rawstringconst", "{{`a}}", "unterminated raw quoted string")]
#[case::number("number", "{{0xi}}", "number syntax")]
#[case::multidefine("multidefine", "{{define `a`}}a{{end}}{{define `a`}}b{{end}}", "multiple definition of template")]
#[case::eof("eof", "{{range .X}}", "unexpected EOF")]
#[case::multidecl("multidecl", "{{$a,$b,$c := 23}}", "too many declarations")]
#[case::undefvar("undefvar", "{{$a}}", "undefined variable")]
#[case::wrongdot("wrongdot", "{{true.any}}", "unexpected . after term")]
#[case::wrongpipeline("wrongpipeline", "{{12|false}}", "non executable command in pipeline")]
#[case::emptypipeline("emptypipeline", "{{ ( ) }}", "missing value for parenthesized pipeline")]
#[case::multilinerawstring("multilinerawstring", "{{ $v := `\n` }} {{", "multilinerawstring:2: unclosed action")]
#[case::rangeundefvar("rangeundefvar", "{{range $k}}{{end}}", "undefined variable")]
#[case::rangeundefvars("rangeundefvars", "{{range $k, $v}}{{end}}", "undefined variable")]
#[case::rangemissingvalue1("rangemissingvalue1", "{{range $k,}}{{end}}", "missing value for range")]
#[case::rangemissingvalue2("rangemissingvalue2", "{{range $k, $v := }}{{end}}", "missing value for range")]
#[case::rangenotvariable1("rangenotvariable1", "{{range $k, .}}{{end}}", "range can only initialize variables")]
#[case::rangenotvariable2("rangenotvariable2", "{{range $k, 123 := .}}{{end}}", "range can only initialize variables")]
#[case::declare_in_with(
    "declare_in_with",
    "{{$x := 23}}{{with $x.y := 3}}{{$x 23}}{{end}}",
    "unexpected \":=\""
)]
#[case::multibyte_escape("multibyte_escape", "{{\"\\本\"}}", "invalid syntax")]
#[case::multibyte_char_escape("multibyte_char_escape", "{{'\\é'}}", "invalid syntax")]
#[case::multibyte_template_escape(
    "multibyte_template_escape",
    "{{template \"\\ü\"}}",
    "invalid syntax"
)]
#[case::invalid_utf8_escape("invalid_utf8_escape", "{{printf \"\\xff\\xfe\"}}", "invalid syntax")]
fn test_parse_error_messages(#[case] name: &str, #[case] input: &str, #[case] expected: &str) {
    let err = parse(name, input, "", "", &builtins(), Mode::default()).unwrap_err();
    let message = err.to_string();

    assert!(message.starts_with("template: "), "{}", message);
    assert!(
        message.contains(expected),
        "{:?}: expected {:?} in {:?}",
        input,
        expected,
        message
    );
}

#[rstest]
#[case("{{with $x := 3}}{{$x 23}}{{end}}")]
#[case("x \r\n\t{{- 3 -}}\n\n\ty")]
#[case("{{.X (.Y .Z) (.A | .B .C) (.E)}}")]
#[case("{{range $x, $y := .SI}}{{.}}{{break}}{{end}}")]
#[case("{{if .X}}a{{else if .Y}}b{{else}}c{{end}}")]
#[case("{{range .SI 1 -3.2i true false 'a' nil}}{{end}}")]
#[case("{{ $x \n := \n 1 \n }}{{$x}}")]
fn test_render_reparses_to_same_tree(#[case] input: &str) {
    let once = render_main(input, false);
    let twice = render_main(&once, false);

    assert_eq!(once, twice);
}

#[test]
fn test_else_if_matches_nested_if() {
    let chained = render_main("{{if .A}}a{{else if .B}}b{{else}}c{{end}}", true);
    let nested = render_main("{{if .A}}a{{else}}{{if .B}}b{{else}}c{{end}}{{end}}", true);

    assert_eq!(chained, nested);
}

#[test]
fn test_else_with_matches_nested_with() {
    let chained = render_main("{{with .A}}a{{else with .B}}b{{end}}", true);
    let nested = render_main("{{with .A}}a{{else}}{{with .B}}b{{end}}{{end}}", true);

    assert_eq!(chained, nested);
}

#[test]
fn test_define_and_block_fill_tree_set() {
    let set = parse_main(
        "{{define `header`}}<h1>{{.Title}}</h1>{{end}}\
         {{template `header` .}}\
         {{block `footer` .}}bye{{end}}",
    )
    .unwrap();

    let mut names: Vec<_> = set.keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, vec!["footer", "header", "test"]);
    assert_eq!(set["header"].render(false), "<h1>{{.Title}}</h1>");
    assert_eq!(set["footer"].render(false), "bye");
    assert_eq!(
        set["test"].render(false),
        "{{template \"header\" .}}{{template \"footer\" .}}"
    );
}

#[test]
fn test_define_variables_are_private() {
    let err = parse_main("{{$x := 1}}{{define `a`}}{{$x}}{{end}}").unwrap_err();
    assert_eq!(err.to_string(), "template: test:1: undefined variable \"$x\"");
}

#[test]
fn test_break_and_continue_as_functions() {
    let funcs = vec![FuncMap::from_names(["break", "continue"])];
    let set = parse("test", "{{break 1}}{{continue}}", "", "", &funcs, Mode::default()).unwrap();
    let root = set["test"].root.as_ref().unwrap();

    assert_eq!(root.nodes.len(), 2);
    assert!(root.nodes.iter().all(|n| n.get_node_type() == NodeType::Action));
    assert_eq!(set["test"].render(false), "{{break 1}}{{continue}}");
}

#[test]
fn test_function_tables_are_searched_in_order() {
    let funcs = vec![
        FuncMap::new(),
        FuncMap::new().with("upper", |s: String| s.to_uppercase()),
    ];
    let set = parse("test", "{{upper .Name}}", "", "", &funcs, Mode::default()).unwrap();

    assert_eq!(set["test"].render(false), "{{upper .Name}}");
}

#[test]
fn test_is_empty_tree() {
    let empty = parse_main(" \n{{/* note */}}\t").unwrap();
    assert!(is_empty_tree(empty["test"].root.as_ref().unwrap()));

    let text = parse_main("x").unwrap();
    assert!(!is_empty_tree(text["test"].root.as_ref().unwrap()));

    // {{with}} counts as content even with an empty body.
    let with = parse_main("{{with .X}}{{end}}").unwrap();
    assert!(!is_empty_tree(with["test"].root.as_ref().unwrap()));
}

#[test]
fn test_custom_delimiters() {
    let set = parse("test", "[[.X]] {{.Y}} [[- 3 -]] z", "[[", "]]", &[], Mode::default()).unwrap();
    assert_eq!(set["test"].render(true), "{{.X}}\" {{.Y}}\"{{3}}\"z\"");
}

#[test]
fn test_comments_kept_in_comment_mode() {
    let mode = Mode {
        parse_comments: true,
        skip_func_check: false,
    };
    let set = parse("test", "a{{/* note */}}b", "", "", &[], mode).unwrap();

    assert_eq!(set["test"].render(false), "a{{/* note */}}b");
}
