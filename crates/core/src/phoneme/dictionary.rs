//! Built-in pronunciation data: a small word dictionary plus letter-to-sound
//! fallback rules. Not a production lexicon; unknown words degrade to the
//! grapheme rules rather than erroring.

/// Dictionary lookup, keyed by lowercased punctuation-stripped word.
pub fn lookup_word(word: &str) -> Option<&'static [&'static str]> {
    let entry: &'static [&'static str] = match word {
        "hello" => &["HH", "AH", "L", "OW"],
        "hi" => &["HH", "AY"],
        "hey" => &["HH", "EY"],
        "yes" => &["Y", "EH", "S"],
        "no" => &["N", "OW"],
        "okay" => &["OW", "K", "EY"],
        "the" => &["DH", "AH"],
        "a" => &["AH"],
        "and" => &["AE", "N", "D"],
        "you" => &["Y", "UW"],
        "i" => &["AY"],
        "is" => &["IH", "Z"],
        "are" => &["AA", "R"],
        "what" => &["W", "AH", "T"],
        "how" => &["HH", "AW"],
        "why" => &["W", "AY"],
        "who" => &["HH", "UW"],
        "can" => &["K", "AE", "N"],
        "help" => &["HH", "EH", "L", "P"],
        "good" => &["G", "UH", "D"],
        "thank" => &["TH", "AE", "NG", "K"],
        "thanks" => &["TH", "AE", "NG", "K", "S"],
        "please" => &["P", "L", "IY", "Z"],
        "welcome" => &["W", "EH", "L", "K", "AH", "M"],
        "today" => &["T", "AH", "D", "EY"],
        "name" => &["N", "EY", "M"],
        "my" => &["M", "AY"],
        "your" => &["Y", "AO", "R"],
        "this" => &["DH", "IH", "S"],
        "that" => &["DH", "AE", "T"],
        "have" => &["HH", "AE", "V"],
        "not" => &["N", "AA", "T"],
        "time" => &["T", "AY", "M"],
        _ => return None,
    };
    Some(entry)
}

/// Letter-to-sound fallback for a single grapheme.
pub fn phonemes_for_grapheme(ch: char) -> Option<&'static str> {
    let symbol = match ch.to_ascii_lowercase() {
        'a' => "AA",
        'e' => "EH",
        'i' => "IH",
        'o' => "OW",
        'u' => "UW",
        'y' => "IY",
        'b' => "B",
        'c' => "K",
        'd' => "D",
        'f' => "F",
        'g' => "G",
        'h' => "HH",
        'j' => "JH",
        'k' => "K",
        'l' => "L",
        'm' => "M",
        'n' => "N",
        'p' => "P",
        'q' => "K",
        'r' => "R",
        's' => "S",
        't' => "T",
        'v' => "V",
        'w' => "W",
        'x' => "K",
        'z' => "Z",
        _ => return None,
    };
    Some(symbol)
}

/// Digraphs recognized ahead of single-letter fallback.
pub fn phonemes_for_digraph(pair: &str) -> Option<&'static str> {
    match pair {
        "th" => Some("TH"),
        "sh" => Some("SH"),
        "ch" => Some("CH"),
        "ng" => Some("NG"),
        _ => None,
    }
}

/// Base duration per phoneme symbol. Vowels 80–150 ms, consonants 40–100 ms.
pub fn base_duration_ms(symbol: &str) -> f64 {
    match symbol {
        "AA" => 120.0,
        "AE" => 110.0,
        "AH" => 100.0,
        "AO" => 120.0,
        "AW" => 140.0,
        "AY" => 140.0,
        "EH" => 100.0,
        "ER" => 110.0,
        "EY" => 120.0,
        "IH" => 90.0,
        "IY" => 110.0,
        "OW" => 130.0,
        "OY" => 150.0,
        "UH" => 90.0,
        "UW" => 130.0,
        "B" => 50.0,
        "CH" => 90.0,
        "D" => 50.0,
        "DH" => 60.0,
        "F" => 70.0,
        "G" => 60.0,
        "HH" => 50.0,
        "JH" => 90.0,
        "K" => 60.0,
        "L" => 70.0,
        "M" => 70.0,
        "N" => 70.0,
        "NG" => 80.0,
        "P" => 50.0,
        "R" => 70.0,
        "S" => 80.0,
        "SH" => 90.0,
        "T" => 50.0,
        "TH" => 80.0,
        "V" => 60.0,
        "W" => 60.0,
        "Y" => 50.0,
        "Z" => 70.0,
        super::SILENCE_SYMBOL => 100.0,
        other if super::is_vowel_symbol(other) => 100.0,
        _ => 60.0,
    }
}
