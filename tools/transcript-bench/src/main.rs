//! Transcript reconstruction CLI for Reply-Glass.
//!
//! Replays saved OCR JSON dumps through the reconstructor without touching
//! the network. Useful for tuning against screenshots that parsed badly:
//! save the provider response once, then iterate offline.
//!
//! Usage:
//!   cargo run -- <response.json>            Print the reconstructed transcript
//!   cargo run -- <response.json> --roles    Also print per-fragment roles
//!   cargo run -- --batch <directory>        All .json files in a directory

use std::path::Path;
use std::time::Instant;

use reply_glass_lib::ocr::transcript::{classify, reconstruct};
use reply_glass_lib::ocr::OcrResponse;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: transcript-bench <response.json> [--roles] | --batch <dir>");
        std::process::exit(2);
    }

    if args[0] == "--batch" {
        let Some(dir) = args.get(1) else {
            eprintln!("--batch needs a directory");
            std::process::exit(2);
        };
        run_batch(Path::new(dir));
    } else {
        let show_roles = args.iter().any(|a| a == "--roles");
        run_one(Path::new(&args[0]), show_roles);
    }
}

fn load(path: &Path) -> OcrResponse {
    let raw = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("cannot read {}: {}", path.display(), e);
        std::process::exit(1);
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        eprintln!("cannot parse {}: {}", path.display(), e);
        std::process::exit(1);
    })
}

fn run_one(path: &Path, show_roles: bool) {
    let response = load(path);

    if show_roles {
        for word in &response.words_result {
            let text = word.words.trim();
            if text.is_empty() {
                continue;
            }
            let Some(loc) = &word.location else { continue };
            println!(
                "{:>4},{:>4}  {:?}  {:?}",
                loc.left,
                loc.top,
                classify(text, loc.left),
                text
            );
        }
        println!("---");
    }

    let start = Instant::now();
    let transcript = reconstruct(&response);
    let elapsed = start.elapsed();
    print!("{}", transcript);
    if !transcript.ends_with('\n') {
        println!();
    }
    eprintln!(
        "[{} fragments -> {} chars in {:?}]",
        response.words_result.len(),
        transcript.len(),
        elapsed
    );
}

fn run_batch(dir: &Path) {
    let mut entries: Vec<_> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) => {
            eprintln!("cannot read {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    };
    entries.sort();

    for path in entries {
        println!("=== {} ===", path.display());
        run_one(&path, false);
        println!();
    }
}
