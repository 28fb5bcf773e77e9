//! The `amyc` binary: wires [`amyc::cli`] argument parsing into the
//! lex -> parse -> name-analyze -> type-check -> codegen pipeline,
//! mirroring `why`'s own `main.rs` stage-by-stage driver shape.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use amyc::cli::{BuildArgs, Cli, Commands, FilesArgs};
use amyc::diagnostics::Reporter;
use amyc::{check_program, codegen::CodeGen, interpreter::Interpreter, parse_sources};

fn main() {
    let cli = Cli::init();
    simple_logger::init_with_level((&cli.verbosity).into()).unwrap();

    let result = match cli.command {
        Commands::Tokens(args) => run_tokens(args),
        Commands::Parse(args) => run_parse(args),
        Commands::Interpret(args) => run_interpret(args),
        Commands::Build(args) => run_build(args),
    };

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(-1);
    }
}

fn read_sources(files: &[PathBuf]) -> Result<Vec<(String, String)>, Box<dyn Error>> {
    files
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("could not read file '{}': {e}", path.display()))?;
            Ok((path.to_string_lossy().to_string(), text))
        })
        .collect()
}

fn run_tokens(args: FilesArgs) -> Result<(), Box<dyn Error>> {
    let sources = read_sources(&args.files)?;
    for (file, text) in &sources {
        let tokens = amyc::lexer::Lexer::new(text, file.clone()).lex()?;
        info!("{file}:\n{:#?}", tokens);
    }
    Ok(())
}

fn run_parse(args: FilesArgs) -> Result<(), Box<dyn Error>> {
    let sources = read_sources(&args.files)?;
    let program = parse_sources(&sources)?;
    info!("Parsed AST:\n{:#?}", program);
    Ok(())
}

fn run_interpret(args: FilesArgs) -> Result<(), Box<dyn Error>> {
    let sources = read_sources(&args.files)?;
    let program = parse_sources(&sources)?;
    let mut reporter = Reporter::new();
    let output = check_program(&program, &mut reporter).ok_or_else(|| diagnostics_summary(&reporter))?;

    let value = Interpreter::new(&output.table, &output.symbolic).run(&output.symbolic);
    amyc::interpreter::flush_stdout();
    info!("result: {value}");
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<(), Box<dyn Error>> {
    let sources = read_sources(&args.files)?;
    let program = parse_sources(&sources)?;

    if args.dump_parsed {
        dump("Parsed AST", &program, args.json)?;
    }

    let mut reporter = Reporter::new();
    let output = check_program(&program, &mut reporter).ok_or_else(|| diagnostics_summary(&reporter))?;

    if args.dump_typed {
        dump("Typed AST", &output.symbolic, args.json)?;
    }

    let wat = CodeGen::new(&output.table).generate(&output.symbolic);

    let first_file = &args.files[0];
    let program_name = first_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "program".to_string());
    let out_dir = first_file.parent().unwrap_or_else(|| Path::new("."));
    let wat_path = args
        .output
        .unwrap_or_else(|| out_dir.join(format!("{program_name}.wat")));

    fs::write(&wat_path, &wat)?;
    info!("wrote {}", wat_path.display());

    let html_path = out_dir.join(format!("{program_name}.html"));
    fs::write(&html_path, html_loader(&program_name))?;

    let wasmout_dir = out_dir.join("wasmout");
    fs::create_dir_all(&wasmout_dir)?;
    fs::write(wasmout_dir.join("run.js"), nodejs_runner(&program_name))?;

    info!(
        "link '{}' into '{}' with wat2wasm to finish the build",
        wat_path.display(),
        wasmout_dir.join(format!("{program_name}.wasm")).display()
    );

    Ok(())
}

fn dump<T: serde::Serialize + std::fmt::Debug>(
    label: &str,
    value: &T,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    if json {
        info!("{label}:\n{}", serde_json::to_string_pretty(value)?);
    } else {
        info!("{label}:\n{:#?}", value);
    }
    Ok(())
}

fn diagnostics_summary(reporter: &Reporter) -> String {
    reporter
        .diagnostics()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_loader(program_name: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>{program_name}</title></head>
  <body>
    <script>
      const imports = {{
        system: {{
          mem: new WebAssembly.Memory({{ initial: 100 }}),
          printInt: (n) => {{ console.log(n); return n; }},
          printString: (ptr) => {{ console.log(ptr); return ptr; }},
          readInt: () => 0,
          readString0: (ptr) => ptr,
        }},
      }};
      WebAssembly.instantiateStreaming(fetch("wasmout/{program_name}.wasm"), imports)
        .then((result) => result.instance.exports["{program_name}_main"]());
    </script>
  </body>
</html>
"#
    )
}

fn nodejs_runner(program_name: &str) -> String {
    format!(
        r#"const fs = require("fs");

const memory = new WebAssembly.Memory({{ initial: 100 }});
const imports = {{
  system: {{
    mem: memory,
    printInt: (n) => {{ console.log(n); return n; }},
    printString: (ptr) => {{ console.log(ptr); return ptr; }},
    readInt: () => 0,
    readString0: (ptr) => ptr,
  }},
}};

const bytes = fs.readFileSync(__dirname + "/{program_name}.wasm");
WebAssembly.instantiate(bytes, imports).then(({{ instance }}) => {{
  instance.exports["{program_name}_main"]();
}});
"#
    )
}
