//! Locale-aware segmentation and normalization of raw text.
//!
//! Latin-script locales are split into plain words. Non-Latin locales use
//! camel-case segmentation, which additionally breaks runs at lower-to-upper
//! case and letter/digit transitions.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex =
        Regex::new(r"[\p{L}\p{N}][\p{L}\p{M}\p{N}]*(?:['’][\p{L}\p{M}\p{N}]+)*")
            .expect("valid regex");
    static ref NON_LATIN_LANGUAGES: HashSet<&'static str> = [
        "am", "ar", "be", "bg", "bn", "el", "fa", "gu", "he", "hi", "hy", "iw", "ja", "ka", "kk",
        "km", "kn", "ko", "ky", "lo", "mk", "ml", "mn", "mr", "my", "ne", "pa", "ru", "si", "sr",
        "ta", "te", "th", "uk", "zh",
    ]
    .into_iter()
    .collect();
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeMode {
    Words,
    CamelCase,
}

impl TokenizeMode {
    pub fn for_locale(locale: &str) -> Self {
        if is_non_latin_locale(locale) {
            TokenizeMode::CamelCase
        } else {
            TokenizeMode::Words
        }
    }
}

/// A normalized term and the byte range it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub text: String,
    pub start: usize,
    pub length: usize,
}

/// Primary language subtag, lowercased: `"pt-BR"` -> `"pt"`.
pub fn language_of(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub fn is_non_latin_locale(locale: &str) -> bool {
    NON_LATIN_LANGUAGES.contains(language_of(locale).as_str())
}

/// Only English has a stopword list; every word of any other locale is kept.
pub fn is_stopword(word: &str, locale: &str) -> bool {
    language_of(locale) == "en" && ENGLISH_STOPWORDS.contains(word)
}

/// Lowercases and folds `word` the same way whatever the tokenize mode, so
/// an indexed term and a query term with the same text always compare equal.
/// Diacritics are dropped from Latin letters only: in other scripts a
/// combining mark is part of the letter (`й`, Devanagari vowel signs).
pub fn normalize(word: &str) -> String {
    let lowered = word
        .nfkc()
        .map(|c| if c == '’' { '\'' } else { c })
        .collect::<String>()
        .to_lowercase();

    let mut folded = String::with_capacity(lowered.len());
    let mut after_latin = false;
    for c in lowered.nfd() {
        if is_combining_mark(c) {
            if !after_latin {
                folded.push(c);
            }
        } else {
            after_latin = is_latin_letter(c);
            folded.push(c);
        }
    }
    folded.nfc().collect()
}

fn is_latin_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
}

/// Segments `text` into normalized tokens. Empty segments are skipped.
pub fn tokenize(text: &str, mode: TokenizeMode) -> impl Iterator<Item = TokenSpan> + '_ {
    WORD_RE
        .find_iter(text)
        .flat_map(move |m| match mode {
            TokenizeMode::Words => vec![(m.start(), m.as_str())],
            TokenizeMode::CamelCase => split_camel_case(m.as_str())
                .into_iter()
                .map(|(offset, part)| (m.start() + offset, part))
                .collect(),
        })
        .filter_map(move |(start, raw)| {
            let text = normalize(raw);
            (!text.is_empty()).then(|| TokenSpan {
                text,
                start,
                length: raw.len(),
            })
        })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    OtherLetter,
    Digit,
    Joiner,
}

fn classify(c: char) -> CharClass {
    if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_numeric() {
        CharClass::Digit
    } else if c.is_alphabetic() {
        CharClass::OtherLetter
    } else {
        CharClass::Joiner
    }
}

fn is_boundary(prev: CharClass, next: CharClass) -> bool {
    match (prev, next) {
        (_, CharClass::Joiner) => false,
        (CharClass::Lower, CharClass::Upper) => true,
        (CharClass::Digit, next) => next != CharClass::Digit,
        (_, CharClass::Digit) => true,
        _ => false,
    }
}

fn split_camel_case(word: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut part_start = 0;
    let mut prev: Option<CharClass> = None;

    for (idx, c) in word.char_indices() {
        let class = classify(c);
        if let Some(prev) = prev {
            if is_boundary(prev, class) {
                parts.push((part_start, &word[part_start..idx]));
                part_start = idx;
            }
        }
        // Marks and apostrophes inherit the class of what they follow.
        if class != CharClass::Joiner {
            prev = Some(class);
        }
    }
    if part_start < word.len() {
        parts.push((part_start, &word[part_start..]));
    }
    parts
}
