//! pipesh: interactive pipeline interpreter.
//!
//! Reads one line at a time from stdin at a `& ` prompt, runs it as a
//! pipeline of forked processes, and exits with a farewell on end of input.

use pipesh::config::Config;
use pipesh::exec::ForkExec;
use pipesh::repl::Repl;

const USAGE: &str = "\
usage: pipesh [--no-config] [--dump-config]

  --no-config     ignore the user config overlay
  --dump-config   print the merged configuration as TOML and exit
  -h, --help      show this message";

fn main() {
    let mut use_overlay = true;
    let mut dump = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-config" => use_overlay = false,
            "--dump-config" => dump = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            other => {
                eprintln!("pipesh: unknown argument: {other}\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    let config = if use_overlay {
        Config::load()
    } else {
        Config::default_config()
    };

    if dump {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("pipesh: cannot render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    pipesh::logging::init(&config.logging);
    log::info!("pipesh {} starting", env!("CARGO_PKG_VERSION"));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut repl = Repl::new(config, ForkExec);
    let code = repl.run(stdin.lock(), &mut stdout, &mut stderr);
    std::process::exit(code);
}
