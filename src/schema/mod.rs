/// Plain data types shared by the engines: word forms, lexemes, languages and
/// the lexical enumerations that tag them.
pub mod dictata;
pub mod language;
pub mod lexeme;
pub mod lexical;
