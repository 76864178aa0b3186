/// Preview: render a grammar tree under every normalization mode.
///
/// Usage: preview <tree.ron> [--config <path>] [--dictionary <dir>] [--language <name>] [--seed <n>]
///
/// Prints the raw fragment render, then the narrated text for Normal,
/// Hemingway and RunOn. Set RUST_LOG=debug to watch word registration.

use lexical_engine::core::composer::NarrativeOptions;
use lexical_engine::core::lexica::Lexica;
use lexical_engine::core::narrator::Narrator;
use lexical_engine::schema::lexical::NarrativeNormalization;
use std::path::Path;
use std::process;

fn print_usage() {
    println!("Usage: preview <tree.ron> [--config <path>] [--dictionary <dir>] [--language <name>] [--seed <n>]");
}

fn main() {
    env_logger::Builder::from_default_env().init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let tree_path = &args[1];
    let mut config_path = None;
    let mut dictionary_dir = None;
    let mut language = None;
    let mut seed = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--dictionary" if i + 1 < args.len() => {
                i += 1;
                dictionary_dir = Some(args[i].clone());
            }
            "--language" if i + 1 < args.len() => {
                i += 1;
                language = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let tree = match Lexica::load_from_ron(Path::new(tree_path)) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ERROR: Failed to load tree '{}': {}", tree_path, e);
            process::exit(1);
        }
    };

    let mut builder = Narrator::builder();
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    if let Some(ref dir) = dictionary_dir {
        builder = builder.dictionary_dir(dir);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let narrator = match builder.build() {
        Ok(narrator) => narrator,
        Err(e) => {
            eprintln!("ERROR: Failed to build narrator: {}", e);
            process::exit(1);
        }
    };

    println!("=== Render ===\n");
    println!("{:?}", tree.to_string());

    let modes = [
        ("Normal", NarrativeNormalization::Normal),
        ("Hemingway", NarrativeNormalization::Hemingway),
        ("RunOn", NarrativeNormalization::RunOn),
    ];
    for (label, mode) in modes {
        let options = NarrativeOptions::default().with_normalization(mode);
        let sentences = tree.sentences(&options).len();
        println!("\n=== {} ({} sentences) ===\n", label, sentences);
        println!("{}", narrator.narrate(&tree, &options, language.as_deref()));
    }
}
