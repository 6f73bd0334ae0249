//! vesperc - the Vesper compiler driver.
//!
//! Reads a single `.vsp` source file, runs the compilation pipeline
//! (lexer, parser, type checker, code generator), and either prints the
//! generated assembly or hands it to the external assembler and linker to
//! produce a native executable.
//!
//! Every failure is reported on stderr as
//! `Error [<phase>]: <message> at line <N>` and exits with status 1.

use clap::Parser as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use vesperc::codegen::{CodeGenerator, X86Backend};
use vesperc::lexer::{tokenize, Token, TokenKind};
use vesperc::parser::Parser;
use vesperc::semantic::TypeChecker;

/// vesperc - the Vesper compiler
#[derive(clap::Parser, Debug)]
#[command(name = "vesperc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Vesper source file (.vsp)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output executable (default: input name without extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Emit assembly to stdout instead of building an executable
    #[arg(short = 'S', long = "emit-asm")]
    emit_assembly: bool,

    /// Keep the intermediate .asm file
    #[arg(short, long)]
    keep_asm: bool,

    /// Only run the lexer and print the token stream (for debugging)
    #[arg(long)]
    tokens: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if !compile(&args) {
        std::process::exit(1);
    }
}

/// Reports a failure in the standard diagnostic format.
fn report(phase: &str, message: &str) {
    eprintln!("Error [{phase}]: {message}");
}

/// Reports a failure carrying a source line.
fn report_at(phase: &str, message: &str, line: u32) {
    eprintln!("Error [{phase}]: {message} at line {line}");
}

/// Runs the whole pipeline. Returns false on the first failure.
fn compile(args: &Args) -> bool {
    let filename = args.input.display().to_string();
    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            report("read", &format!("Cannot open file: {filename}: {err}"));
            return false;
        }
    };
    log::debug!("read {} bytes from {filename}", source.len());

    let tokens = tokenize(&source, &filename);

    if args.tokens {
        dump_tokens(&filename, &tokens);
        return true;
    }

    // The lexer terminates the stream at the first error token.
    if let Some(error) = tokens.iter().find(|t| t.kind == TokenKind::Error) {
        report_at("lexer", &error.text, error.location.line);
        return false;
    }
    log::debug!("tokenized: {} tokens", tokens.len());

    let program = match Parser::new(&tokens).parse() {
        Ok(program) => program,
        Err(err) => {
            report_at("parser", &err.to_string(), err.location().line);
            return false;
        }
    };
    log::debug!("parsed: {} statements", program.statements.len());

    if let Err(err) = TypeChecker::new().check(&program) {
        report_at("type", &err.to_string(), err.location().line);
        return false;
    }

    let backend = X86Backend::new();
    let output = match backend.generate(&program) {
        Ok(output) => output,
        Err(err) => {
            match &err.location {
                Some(location) => report_at("codegen", &err.to_string(), location.line),
                None => report("codegen", &err.to_string()),
            }
            return false;
        }
    };

    if args.emit_assembly {
        print!("{}", output.code);
        return true;
    }

    let executable = match &args.output {
        Some(path) => path.clone(),
        None => default_output(&args.input),
    };
    let asm_file = executable.with_extension(&output.extension);
    let obj_file = executable.with_extension("o");

    if let Err(err) = fs::write(&asm_file, &output.code) {
        report(
            "codegen",
            &format!("Cannot write assembly file: {}: {err}", asm_file.display()),
        );
        return false;
    }
    log::debug!("generated assembly: {}", asm_file.display());

    let ok = assemble(&asm_file, &obj_file) && link(&obj_file, &executable);

    // Intermediates do not outlive the build.
    if !args.keep_asm {
        let _ = fs::remove_file(&asm_file);
    }
    let _ = fs::remove_file(&obj_file);

    if ok {
        log::info!("compiled successfully: {}", executable.display());
    }
    ok
}

/// Default executable path: the input's stem, `.exe` on Windows.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut path = PathBuf::from(stem);
    if cfg!(target_os = "windows") {
        path.set_extension("exe");
    }
    path
}

/// Prints the token stream, one token per line.
fn dump_tokens(filename: &str, tokens: &[Token]) {
    println!("Tokens for {filename}:");
    println!("{:-<60}", "");
    for token in tokens {
        println!(
            "{:>4}:{:<4} {:20} {:?}",
            token.location.line,
            token.location.column,
            format!("{:?}", token.kind),
            token.text
        );
    }
}

/// Runs NASM over the generated assembly.
fn assemble(asm_file: &Path, obj_file: &Path) -> bool {
    let format = if cfg!(target_os = "windows") {
        "win64"
    } else if cfg!(target_os = "macos") {
        "macho64"
    } else {
        "elf64"
    };

    match run_tool(
        Command::new("nasm")
            .arg("-f")
            .arg(format)
            .arg("-o")
            .arg(obj_file)
            .arg(asm_file),
    ) {
        Ok(0) => return true,
        Ok(code) if cfg!(target_os = "windows") => {
            // Old toolchains only ship the 32-bit output format.
            log::debug!("nasm -f win64 failed ({code}), retrying with win32");
            match run_tool(
                Command::new("nasm")
                    .arg("-f")
                    .arg("win32")
                    .arg("-o")
                    .arg(obj_file)
                    .arg(asm_file),
            ) {
                Ok(0) => return true,
                Ok(code) => {
                    report("assembler", &format!("NASM failed with exit code {code}"));
                    return false;
                }
                Err(err) => {
                    report("assembler", &err);
                    return false;
                }
            }
        }
        Ok(code) => {
            report("assembler", &format!("NASM failed with exit code {code}"));
            return false;
        }
        Err(err) => {
            report("assembler", &err);
            return false;
        }
    }
}

/// Links the object file with the platform linker, falling back to gcc.
fn link(obj_file: &Path, executable: &Path) -> bool {
    let mut primary = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("link");
        cmd.arg("/nologo")
            .arg("/subsystem:console")
            .arg("/entry:main")
            .arg(format!("/out:{}", executable.display()))
            .arg(obj_file)
            .arg("kernel32.lib")
            .arg("msvcrt.lib")
            .arg("legacy_stdio_definitions.lib");
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("ld");
        cmd.arg("-o").arg(executable).arg(obj_file).arg("-lSystem");
        cmd
    } else {
        let mut cmd = Command::new("ld");
        cmd.arg("-dynamic-linker")
            .arg("/lib64/ld-linux-x86-64.so.2")
            .arg("-o")
            .arg(executable)
            .arg(obj_file)
            .arg("-lc");
        cmd
    };

    if matches!(run_tool(&mut primary), Ok(0)) {
        return true;
    }
    log::debug!("platform linker failed, trying gcc fallback");

    let mut fallback = Command::new("gcc");
    if !cfg!(target_os = "windows") {
        fallback.arg("-no-pie");
    }
    fallback.arg("-o").arg(executable).arg(obj_file);

    match run_tool(&mut fallback) {
        Ok(0) => true,
        Ok(_) => {
            report("linker", "Linking failed");
            false
        }
        Err(err) => {
            report("linker", &err);
            false
        }
    }
}

/// Runs a tool to completion, returning its exit code.
fn run_tool(command: &mut Command) -> Result<i32, String> {
    log::debug!("running: {command:?}");
    match command.status() {
        Ok(status) => Ok(status.code().unwrap_or(-1)),
        Err(err) => Err(format!("Cannot run {:?}: {err}", command.get_program())),
    }
}
