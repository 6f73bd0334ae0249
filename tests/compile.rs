//! End-to-end tests for the vesperc CLI.
//!
//! These drive the built binary in `-S` (emit assembly) and `--tokens`
//! modes, which exercise the whole pipeline without needing an assembler
//! or linker on the test machine.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

/// Writes a source file into a fresh temp dir and returns both.
fn source_file(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

fn vesperc() -> Command {
    Command::cargo_bin("vesperc").unwrap()
}

#[test]
fn emits_assembly_for_a_valid_program() {
    let (_dir, path) = source_file(
        "add.vsp",
        "func add(a: int, b: int) => int { return a + b }\nio.print(add(2, 40))\n",
    );

    vesperc()
        .arg("-S")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("global main"))
        .stdout(predicate::str::contains("_user_add"))
        .stdout(predicate::str::contains("call _print_int"));
}

#[test]
fn assembly_is_byte_identical_across_runs() {
    let (_dir, path) = source_file(
        "loop.vsp",
        "var i: int = 0\nwhile (i < 3) { i = i + 1 }\nio.print(i)\n",
    );

    let first = vesperc().arg("-S").arg(&path).output().unwrap();
    let second = vesperc().arg("-S").arg(&path).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn type_error_reports_phase_and_line() {
    let (_dir, path) = source_file("immutable.vsp", "let x: int = 1\nx = 2\n");

    vesperc()
        .arg("-S")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error [type]: Cannot assign to immutable variable: x at line 2",
        ));
}

#[test]
fn lex_error_reports_phase_and_line() {
    let (_dir, path) = source_file("stray.vsp", "let a: int = 1\nlet b: int = 1 & 2\n");

    vesperc()
        .arg("-S")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error [lexer]: Unexpected character '&' at line 2",
        ));
}

#[test]
fn parse_error_reports_phase_and_line() {
    let (_dir, path) = source_file("broken.vsp", "if (true { io.print(1) }\n");

    vesperc()
        .arg("-S")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error [parser]: Expected ')' after condition at line 1",
        ));
}

#[test]
fn missing_input_reports_read_phase() {
    vesperc()
        .arg("-S")
        .arg("does-not-exist.vsp")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error [read]: Cannot open file"));
}

#[test]
fn token_dump_lists_kinds() {
    let (_dir, path) = source_file("tokens.vsp", "let x: int = 42\n");

    vesperc()
        .arg("--tokens")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Let"))
        .stdout(predicate::str::contains("IntegerLiteral"))
        .stdout(predicate::str::contains("Eof"));
}

#[test]
fn string_program_emits_interned_data() {
    let (_dir, path) = source_file("hello.vsp", "let s: string = \"hi\"\nio.print(s)\n");

    vesperc()
        .arg("-S")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("call _print_str"))
        .stdout(predicate::str::contains("db 104, 105, 0"));
}
