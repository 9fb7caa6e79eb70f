//! End-to-end pipeline tests over in-memory modules.

use pretty_assertions::assert_eq;

use refu_analysis::ModuleId;
use refuc::{CompileOptions, Compiler, DriverError, Outcome};

fn compiler() -> Compiler {
    Compiler::new(CompileOptions::default())
}

#[test]
fn single_module_compiles_to_rir() {
    let mut c = compiler();
    let root = c.add_module_source("main", "main.rf", "fn add(a:i32, b:i32) -> i32 { a + b }");
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(outcome.exit_code(), 0);

    let text = c.rir_text(root).unwrap();
    assert!(text.starts_with("fndef(add; i32,i32; i32)"), "{text}");
}

#[test]
fn semantic_errors_exit_one_and_skip_rir() {
    let mut c = compiler();
    let root = c.add_module_source("main", "main.rf", "fn f(x:i32, x:i32) -> i32 { x }");
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::SourceErrors);
    assert_eq!(outcome.exit_code(), 1);
    assert!(c.rir(root).is_none());

    let flushed = c.flush_diagnostics();
    assert!(
        flushed.contains("duplicate symbol 'x' in function parameters"),
        "{flushed}"
    );
    assert!(flushed.contains("main.rf:1:13"), "{flushed}");
}

#[test]
fn syntax_errors_exit_one() {
    let mut c = compiler();
    c.add_module_source("main", "main.rf", "fn f( {");
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::SourceErrors);
}

#[test]
fn empty_root_module_is_a_driver_error() {
    let mut c = compiler();
    c.add_module_source("main", "main.rf", "// nothing here\n");
    let err = c.run().unwrap_err();
    assert!(matches!(err, DriverError::EmptyModule(_)));
}

#[test]
fn imports_wire_dependencies_in_topological_order() {
    let mut c = compiler();
    let root = c.add_module_source(
        "main",
        "main.rf",
        "import shapes\n\
         fn main() -> nil { let s = Shape(3.0, 4.0) }",
    );
    let shapes = c.add_module_source(
        "shapes",
        "shapes.rf",
        "type Shape { radius:f32 | width:f32, height:f32 }",
    );
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::Success, "{}", c.flush_diagnostics());

    // dependencies come first in the sorted order
    let order = c.sorted_order().to_vec();
    let pos = |id: ModuleId| order.iter().position(|&m| m == id).unwrap();
    assert!(pos(shapes) < pos(root));

    // the constructor lowered against the imported type
    let text = c.rir_text(root).unwrap().to_string();
    assert!(text.contains("alloca Shape"), "{text}");
    assert!(text.contains("typedef Shape"), "{text}");
}

#[test]
fn missing_import_is_a_driver_error() {
    let mut c = compiler();
    c.add_module_source("main", "main.rf", "import nowhere\nfn main() -> nil { }");
    let err = c.run().unwrap_err();
    assert!(matches!(err, DriverError::ModuleNotFound { .. }));
}

#[test]
fn foreign_imports_create_no_dependency() {
    let mut c = compiler();
    let root = c.add_module_source(
        "main",
        "main.rf",
        "foreign import libc\nfn main() -> nil { }",
    );
    c.run().unwrap();
    // only the implicit stdlib dependency
    let deps = &c.module(root).deps;
    assert_eq!(deps.len(), 1);
    assert_eq!(c.module(deps[0]).name, "stdlib");
}

#[test]
fn dependency_cycle_is_fatal() {
    let mut c = compiler();
    c.add_module_source("a", "a.rf", "import b\nfn fa() -> nil { }");
    c.add_module_source("b", "b.rf", "import a\nfn fb() -> nil { }");
    let err = c.run().unwrap_err();
    assert!(matches!(err, DriverError::Cycle(_)));
}

#[test]
fn root_module_can_call_the_stdlib() {
    let mut c = compiler();
    let root = c.add_module_source(
        "main",
        "main.rf",
        "fn main() -> nil { print(\"hello\") }",
    );
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::Success, "{}", c.flush_diagnostics());
    let text = c.rir_text(root).unwrap();
    assert!(text.contains("call print(@str0)"), "{text}");
}

#[test]
fn cancellation_surfaces_as_driver_error() {
    let mut c = compiler();
    c.add_module_source("main", "main.rf", "fn main() -> nil { }");
    c.cancel_flag().cancel();
    let err = c.run().unwrap_err();
    assert!(matches!(err, DriverError::Analysis(_)));
}

#[test]
fn diagnostics_flush_in_encounter_order() {
    let mut c = compiler();
    c.add_module_source(
        "main",
        "main.rf",
        "fn f(a:i8, b:i64) -> nil { b = a\nmystery() }",
    );
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::SourceErrors);
    let flushed = c.flush_diagnostics();
    let warn_pos = flushed.find("implicit conversion").unwrap();
    let err_pos = flushed.find("unknown identifier").unwrap();
    assert!(warn_pos < err_pos, "{flushed}");
}

#[test]
fn warnings_alone_do_not_fail_the_build() {
    let mut c = compiler();
    let root = c.add_module_source(
        "main",
        "main.rf",
        "fn f(a:i8, b:i64) -> nil { b = a }",
    );
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::Success);
    assert!(c.rir(root).is_some());
    assert!(c.flush_diagnostics().contains("implicit conversion"));
}

#[test]
fn warnings_can_be_silenced() {
    let mut c = Compiler::new(CompileOptions {
        warn_implicit_conversions: false,
        ..CompileOptions::default()
    });
    c.add_module_source("main", "main.rf", "fn f(a:i8, b:i64) -> nil { b = a }");
    c.run().unwrap();
    assert_eq!(c.flush_diagnostics(), "");
}

#[test]
fn shared_dependency_compiles_once_diamond() {
    let mut c = compiler();
    c.add_module_source(
        "main",
        "main.rf",
        "import left\nimport right\nfn main() -> nil { }",
    );
    c.add_module_source("left", "left.rf", "import base\nfn l() -> nil { }");
    c.add_module_source("right", "right.rf", "import base\nfn r() -> nil { }");
    c.add_module_source("base", "base.rf", "type P { x:i32, y:i32 }");
    let outcome = c.run().unwrap();
    assert_eq!(outcome, Outcome::Success, "{}", c.flush_diagnostics());
    // each module appears exactly once in the sorted order
    assert_eq!(c.sorted_order().len(), 5); // four modules + stdlib
}
