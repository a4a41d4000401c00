use clap::Parser;

use lua51_disasm::cli::Args;
use lua51_disasm::prototype::decode_chunk;
use lua51_disasm::registry::ArtifactRegistry;
use lua51_disasm::repl::{Repl, Session};

fn main() {
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let bytes = match std::fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::error!("failed to read {}: {err}", args.file.display());
            std::process::exit(1);
        }
    };

    let mut registry = ArtifactRegistry::new();
    let chunk = match decode_chunk(&bytes, &mut registry) {
        Ok(chunk) => chunk,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let source_label = args.file.display().to_string();
    let mut session = Session::new(chunk, registry, source_label);
    let mut repl = Repl::new(&mut session);
    if let Err(err) = repl.run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
