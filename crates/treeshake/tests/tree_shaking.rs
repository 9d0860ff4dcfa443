use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use treeshake::config::ConfigError;
use treeshake::{Compiler, Config, MemoryLoader, ShakeError};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test/fixtures")
        .join(name)
        .join("index.ts")
}

fn run_fixture(name: &str) -> Result<String> {
    treeshake::run(&fixture(name))
}

fn shake_error(result: Result<String>) -> ShakeError {
    result.unwrap_err().downcast::<ShakeError>().unwrap()
}

fn test_files(files: &[(&str, &str)]) -> Result<String> {
    test_files_with(Config::default(), "/tmp/entry.ts", files)
}

fn test_files_with(config: Config, entry: &str, files: &[(&str, &str)]) -> Result<String> {
    let files = files
        .iter()
        .map(|(path, content)| (PathBuf::from(path), content.to_string()))
        .collect::<HashMap<_, _>>();
    let compiler = Compiler::new(config, Arc::new(MemoryLoader::new(files)));
    compiler.compile(Path::new(entry))
}

#[test]
fn single_function() {
    let output = run_fixture("simple").unwrap();
    insta::assert_snapshot!(output, @r###"
export function greet(name: string): string {
  return "hello " + name;
}
"###);
}

#[test]
fn imported_helper_without_unused() {
    let output = run_fixture("imports_and_exports").unwrap();
    insta::assert_snapshot!(output, @r###"
export function main(): number {
  return helper(2);
}
function helper(n: number): number {
  return n * FACTOR;
}
const FACTOR = 21;
"###);
    assert!(!output.contains("unused"));
}

#[test]
fn mutual_recursion() {
    let output = run_fixture("mutual_recursion").unwrap();
    insta::assert_snapshot!(output, @r###"
export function isEven(n: number): boolean {
  return n === 0 ? true : isOdd(n - 1);
}
export function isOdd(n: number): boolean {
  return n === 0 ? false : isEven(n - 1);
}
"###);
    assert_eq!(output.matches("function isOdd").count(), 1);
}

#[test]
fn top_level_statements() {
    let output = run_fixture("top_level_statements").unwrap();
    insta::assert_snapshot!(output, @r###"
registry.set("loaded", "yes");
const registry = new Map<string, string>();
registry.set("version", VERSION);
const VERSION = "1.0.0";
"###);
    assert!(!output.contains("reset"));
    assert!(!output.contains("freeze"));
}

#[test]
fn re_export_through_directories() {
    let output = run_fixture("re_export").unwrap();
    insta::assert_snapshot!(output, @r###"
export function format(n: number): string {
  return pad(String(n), 4);
}
function pad(s: string, width: number): string {
  return s.length >= width ? s : pad("0" + s, width);
}
"###);
}

#[test]
fn type_declarations_are_reachable() {
    let output = run_fixture("types").unwrap();
    insta::assert_snapshot!(output, @r###"
export function total(shapes: Shape[]): number {
  return shapes.reduce((sum, shape) => sum + area(shape), 0);
}
interface Shape {
  kind: Kind;
  size: number;
}
enum Kind {
  Circle,
  Square,
}
function area(shape: Shape): number {
  return shape.kind === Kind.Circle ? Math.PI * shape.size ** 2 : shape.size ** 2;
}
"###);
    assert!(!output.contains("Unused"));
}

#[test]
fn globals_from_config_file() {
    let output = run_fixture("globals_config").unwrap();
    assert_eq!(
        output,
        "export const read = (path: string) => Deno.readTextFileSync(path);"
    );
}

#[test]
fn unresolved_symbol_is_fatal() {
    let path = fixture("unresolved");
    assert_eq!(
        shake_error(treeshake::run(&path)),
        ShakeError::UnresolvedSymbol {
            name: "notDeclaredAnywhere".to_string(),
            module: path.to_string_lossy().to_string(),
        }
    );
}

#[test]
fn aliased_import_is_fatal() {
    assert!(matches!(
        shake_error(run_fixture("alias")),
        ShakeError::AliasMismatch { local, imported, .. } if local == "h" && imported == "helper"
    ));
}

#[test]
fn namespace_import_is_unsupported() {
    assert!(matches!(
        shake_error(run_fixture("parse_shape")),
        ShakeError::ParseShape { .. }
    ));
}

#[test]
fn invalid_entrypoint() {
    let js_entry = fixture("simple").with_extension("js");
    assert!(matches!(
        shake_error(treeshake::run(&js_entry)),
        ShakeError::InvalidEntrypoint { path, .. } if path.ends_with("index.js")
    ));

    let missing = fixture("simple").with_file_name("missing.ts");
    assert!(matches!(
        shake_error(treeshake::run(&missing)),
        ShakeError::InvalidEntrypoint { .. }
    ));
}

#[test]
fn broken_config_does_not_hide_invalid_entrypoint() {
    let js_entry = fixture("broken_config").with_extension("js");
    assert!(matches!(
        shake_error(treeshake::run(&js_entry)),
        ShakeError::InvalidEntrypoint { path, .. } if path.ends_with("index.js")
    ));

    let err = run_fixture("broken_config").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Parse { .. })
    ));
}

#[test]
fn idempotent_runs() {
    let first = run_fixture("re_export").unwrap();
    let second = run_fixture("re_export").unwrap();
    assert_eq!(first, second);

    let files = [
        (
            "/tmp/entry.ts",
            "import { a } from './a';\nimport { b } from './b';\nexport const both = [a(), b()];",
        ),
        ("/tmp/a.ts", "import { b } from './b';\nexport function a() { return b(); }"),
        ("/tmp/b.ts", "export function b() { return 1; }\nconsole.log('b loaded');"),
    ];
    let first = test_files(&files).unwrap();
    for _ in 0..5 {
        assert_eq!(test_files(&files).unwrap(), first);
    }
    insta::assert_snapshot!(first, @r###"
console.log('b loaded');
export const both = [a(), b()];
function a() { return b(); }
function b() { return 1; }
"###);
}

#[test]
fn shared_dependency_emitted_once() {
    let output = test_files(&[
        (
            "/tmp/entry.ts",
            "import { left } from './left';\nimport { right } from './right';\nexport function main() { return left() + right(); }",
        ),
        ("/tmp/left.ts", "import { shared } from './shared';\nexport function left() { return shared(); }"),
        ("/tmp/right.ts", "import { shared } from './shared';\nexport function right() { return shared(); }"),
        ("/tmp/shared.ts", "export function shared() { return 1; }"),
    ])
    .unwrap();
    assert_eq!(output.matches("function shared").count(), 1);
    insta::assert_snapshot!(output, @r###"
export function main() { return left() + right(); }
function left() { return shared(); }
function shared() { return 1; }
function right() { return shared(); }
"###);
}

#[test]
fn missing_module() {
    let err = shake_error(test_files(&[(
        "/tmp/entry.ts",
        "import { nope } from './nope';\nexport const x = nope;",
    )]));
    assert_eq!(
        err,
        ShakeError::ModuleNotFound {
            specifier: "./nope".to_string(),
            importer: "/tmp/entry.ts".to_string(),
            path: "/tmp/nope.ts".to_string(),
        }
    );
}

#[test]
fn scoped_names_are_not_dependencies() {
    let output = test_files(&[(
        "/tmp/entry.ts",
        r#"function value() { return 0; }
function T() {}
export function pick<T>(items: T[], value: (item: T) => boolean): T | undefined {
  for (const item of items) {
    if (value(item)) return item;
  }
  return undefined;
}"#,
    )])
    .unwrap();
    assert!(output.starts_with("export function pick"));
    assert!(!output.contains("return 0"));
    assert!(!output.contains("function T()"));
}

#[test]
fn decorators_before_export_are_kept() {
    let output = test_files(&[(
        "/tmp/entry.ts",
        "function dec(c: any) {}\n@dec\nexport class A {}",
    )])
    .unwrap();
    insta::assert_snapshot!(output, @r###"
@dec
export class A {}
function dec(c: any) {}
"###);

    let output = test_files(&[
        ("/tmp/entry.ts", "import { Model } from './model';\nexport const make = () => new Model();"),
        ("/tmp/model.ts", "function track(c: any) {}\n@track\nexport class Model {}"),
    ])
    .unwrap();
    insta::assert_snapshot!(output, @r###"
export const make = () => new Model();
@track
class Model {}
function track(c: any) {}
"###);
}

#[test]
fn default_parameter_sees_outer_declaration() {
    let output = test_files(&[(
        "/tmp/entry.ts",
        "const x = 1;\nexport function f(a = x) { var x = 2; return a + x; }",
    )])
    .unwrap();
    insta::assert_snapshot!(output, @r###"
export function f(a = x) { var x = 2; return a + x; }
const x = 1;
"###);
}

#[test]
fn tsx_components() {
    let config = Config {
        extension: "tsx".to_string(),
        ..Default::default()
    };
    let output = test_files_with(
        config,
        "/src/index.tsx",
        &[
            (
                "/src/index.tsx",
                "import { Title } from './title';\nexport const App = () => <div className=\"a\"><Title /></div>;",
            ),
            ("/src/title.tsx", "export const Title = () => <h1>hi</h1>;\nexport const Unused = () => <p />;"),
        ],
    )
    .unwrap();
    insta::assert_snapshot!(output, @r###"
export const App = () => <div className="a"><Title /></div>;
const Title = () => <h1>hi</h1>;
"###);
}

#[test]
fn same_name_in_two_modules() {
    let output = test_files(&[
        (
            "/tmp/entry.ts",
            "import { a } from './a';\nimport { b } from './b';\nexport const both = a() + b();",
        ),
        ("/tmp/a.ts", "function util() { return 1; }\nexport function a() { return util(); }"),
        ("/tmp/b.ts", "function util() { return 2; }\nexport function b() { return util(); }"),
    ])
    .unwrap();
    assert!(output.contains("function util() { return 1; }"));
    assert!(output.contains("function util() { return 2; }"));
}
