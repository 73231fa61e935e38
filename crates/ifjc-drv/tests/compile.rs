//! End-to-end tests driving the `ifjc` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn ifjc() -> Command {
    Command::cargo_bin("ifjc").expect("binary should build")
}

const PROLOGUE: &str = "import \"ifj25\" for Ifj\n";

fn with_prologue(body: &str) -> String {
    format!("{}{}", PROLOGUE, body)
}

#[test]
fn test_minimal_program() {
    let source = with_prologue("class Main { static main() { } }\n");
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(".IFJcode25"))
        .stdout(predicate::str::contains("LABEL main$0"))
        .stdout(predicate::str::contains("CALL main$0"))
        .stdout(predicate::str::contains("EXIT int@0"));
}

#[test]
fn test_hello_write() {
    let source = with_prologue(
        "class Main {\n static main() {\n Ifj.write(\"hi\\n\")\n }\n}\n",
    );
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("string@hi\\010"))
        .stdout(predicate::str::is_match(r"WRITE LF@\S+\$1").unwrap());
}

#[test]
fn test_overload_by_arity() {
    let source = with_prologue(
        "class Main {\n static f() {\n return 0\n }\n static f(a) {\n return a\n }\n static main() {\n var x\n x = f(1)\n }\n}\n",
    );
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("LABEL f$0"))
        .stdout(predicate::str::contains("LABEL f$1"))
        .stdout(predicate::str::contains("CALL f$1"));
}

#[test]
fn test_forward_reference() {
    let source = with_prologue(
        "class Main {\n static main() {\n var x\n x = g(1)\n }\n static g(a) {\n return a\n }\n}\n",
    );
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("CALL g$1"))
        .stdout(predicate::str::contains("LABEL g$1"));
}

#[test]
fn test_type_clash_exits_six() {
    let source = with_prologue(
        "class Main {\n static main() {\n var x\n x = 1 + \"a\"\n }\n}\n",
    );
    ifjc().write_stdin(source).assert().code(6);
}

#[test]
fn test_short_circuit_and() {
    let source = with_prologue(
        "class Main {\n static main() {\n var a\n var b\n a = true\n b = true\n if (a && b) {\n a = false\n }\n }\n}\n",
    );
    let output = ifjc().write_stdin(source).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let left = stdout.find("PUSHS LF@a$1").expect("left operand");
    let jump = stdout[left..]
        .find("JUMPIFEQ $and_false_")
        .expect("short-circuit jump")
        + left;
    let right = stdout[jump..].find("PUSHS LF@b$1").expect("right operand") + jump;
    assert!(left < jump && jump < right);
    assert!(stdout[jump..right].contains("nil@nil"));
}

#[test]
fn test_substring_in_range_loops() {
    let source = with_prologue(
        "class Main {\n static main() {\n var s\n s = Ifj.substring(\"abc\", 0, 3)\n }\n}\n",
    );
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("GETCHAR"))
        .stdout(predicate::str::contains("CONCAT"))
        .stdout(predicate::str::contains("MOVE LF@$$tmp_1$1 int@0"))
        .stdout(predicate::str::contains("MOVE LF@$$tmp_2$1 int@3"));
}

#[test]
fn test_missing_prologue_is_syntax_error() {
    ifjc()
        .write_stdin("class Main { static main() { } }\n")
        .assert()
        .code(2);
}

#[test]
fn test_lexical_error_exit_code() {
    let source = with_prologue("class Main {\n static main() {\n var x\n x = 0x\n }\n}\n");
    ifjc().write_stdin(source).assert().code(1);
}

#[test]
fn test_undefined_variable_exit_code() {
    let source = with_prologue("class Main {\n static main() {\n var x\n x = y\n }\n}\n");
    ifjc().write_stdin(source).assert().code(3);
}

#[test]
fn test_redefinition_exit_code() {
    let source = with_prologue(
        "class Main {\n static main() {\n var x\n var x\n }\n}\n",
    );
    ifjc().write_stdin(source).assert().code(4);
}

#[test]
fn test_wrong_arity_exit_code() {
    let source = with_prologue(
        "class Main {\n static main() {\n var x\n x = g(1, 2)\n }\n static g(a) {\n return a\n }\n}\n",
    );
    ifjc().write_stdin(source).assert().code(5);
}

#[test]
fn test_missing_main_exit_code() {
    let source = with_prologue("class Main {\n static helper() {\n }\n}\n");
    ifjc().write_stdin(source).assert().code(3);
}

#[test]
fn test_diagnostics_go_to_stderr() {
    let source = with_prologue("class Main {\n static main() {\n var x\n x = y\n }\n}\n");
    ifjc()
        .write_stdin(source)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("undefined variable"));
}

#[test]
fn test_file_input() {
    let source = with_prologue("class Main { static main() { } }\n");
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(source.as_bytes()).expect("write source");

    ifjc()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("LABEL main$0"));
}

#[test]
fn test_emit_tokens_mode() {
    let source = with_prologue("class Main { static main() { } }\n");
    ifjc()
        .arg("--emit-tokens")
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("KW_CLASS"))
        .stdout(predicate::str::contains("IDENTIFIER Main"));
}

#[test]
fn test_emit_ast_mode() {
    let source = with_prologue("class Main { static main() { } }\n");
    ifjc()
        .arg("--emit-ast")
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("ClassDec"))
        .stdout(predicate::str::contains("FunDec"));
}

#[test]
fn test_unknown_option_is_rejected() {
    ifjc().arg("--bogus").assert().code(99);
}

#[test]
fn test_getter_read_emits_call_and_pop() {
    let source = with_prologue(
        "class Main {\n static x {\n return \"s\"\n }\n static main() {\n var y\n y = x\n }\n}\n",
    );
    let output = ifjc().write_stdin(source).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let call = stdout.find("CALL x_get").expect("getter call");
    let pop = stdout.find("POPS LF@y$1").expect("target pop");
    assert!(call < pop);
}

#[test]
fn test_while_loop_compiles() {
    let source = with_prologue(
        "class Main {\n static main() {\n var i\n i = 0\n while (i < 3) {\n i = i + 1\n }\n }\n}\n",
    );
    ifjc()
        .write_stdin(source)
        .assert()
        .success()
        .stdout(predicate::str::contains("LABEL $while_start_"))
        .stdout(predicate::str::contains("JUMPIFEQ $while_end_"));
}
