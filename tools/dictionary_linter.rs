/// Dictionary Linter: checks a stored dictionary for broken relation links.
///
/// Usage: dictionary_linter <dictionary_dir> [--base <language>]
///
/// Reports relation keys pointing at missing forms or phrases, synonym and
/// antonym links recorded on one side only, and phrases built from missing
/// forms. Exits non-zero when any error is found.

use lexical_engine::core::dictionary::Dictionary;
use lexical_engine::core::store::RonStore;
use lexical_engine::schema::dictata::Relation;
use std::path::Path;
use std::process;

fn main() {
    env_logger::Builder::from_default_env().init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: dictionary_linter <dictionary_dir> [--base <language>]");
        process::exit(0);
    }

    let dictionary_dir = &args[1];
    let mut base_language = "English".to_string();

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--base" && i + 1 < args.len() {
            i += 1;
            base_language = args[i].clone();
        }
        i += 1;
    }

    if !Path::new(dictionary_dir).is_dir() {
        eprintln!("ERROR: Path '{}' is not a directory", dictionary_dir);
        process::exit(1);
    }

    let dictionary = match RonStore::open(dictionary_dir)
        .map_err(|e| e.to_string())
        .and_then(|store| Dictionary::open(&base_language, Box::new(store)).map_err(|e| e.to_string()))
    {
        Ok(dictionary) => dictionary,
        Err(e) => {
            eprintln!("ERROR: Failed to load dictionary: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} lexemes, {} forms, {} phrases",
        dictionary.lexemes().len(),
        dictionary.all_forms().len(),
        dictionary.phrases().len()
    );

    let (errors, warnings) = lint_dictionary(&dictionary);

    println!("\n=== Dictionary Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_dictionary(dictionary: &Dictionary) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for form in dictionary.all_forms() {
        let key = form.key();

        for relation in [Relation::Synonym, Relation::Antonym] {
            for other_key in form.relations(relation) {
                match dictionary.get_dictata(other_key) {
                    None => errors.push(format!(
                        "{} lists missing {:?} {}",
                        key, relation, other_key
                    )),
                    Some(other) if !other.relations(relation).contains(&key) => {
                        warnings.push(format!(
                            "{} lists {:?} {} but not the other way round",
                            key, relation, other_key
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        for phrase_key in form.phrase_synonyms.iter().chain(form.phrase_antonyms.iter()) {
            if dictionary.get_phrase(phrase_key).is_none() {
                errors.push(format!("{} references missing phrase {}", key, phrase_key));
            }
        }

        if form.form_group < 1 {
            warnings.push(format!("{} has no form group assigned", key));
        }
    }

    for phrase in dictionary.phrases() {
        for word in &phrase.words {
            if dictionary.get_dictata(word).is_none() {
                errors.push(format!("phrase {} is built from missing form {}", phrase.key(), word));
            }
        }
        for other_key in phrase.synonyms.iter().chain(phrase.antonyms.iter()) {
            if dictionary.get_dictata(other_key).is_none() {
                errors.push(format!("phrase {} relates to missing form {}", phrase.key(), other_key));
            }
        }
    }

    (errors, warnings)
}
