//! Spoken-token to SAN normalization.
//!
//! Tokens arrive lowercase and split per letter (`["n", "c", "3"]`). The
//! rules below restore SAN casing:
//!
//! 1. Tokens are trimmed and concatenated.
//! 2. `n`, `r`, `q`, `k` and `o` are upper-cased. `b` is left alone because
//!    it is also a file letter.
//! 3. A three-character move starting with `b` is read as a bishop move
//!    (`bc4` → `Bc4`). Pawn captures from the b-file are four characters
//!    (`bxc5`) and stay lowercase. Any other three-character text starting
//!    with a b-file pawn is misread; this is a known limitation.
//! 4. `OO` / `OOO` (letter O or digit zero) become `O-O` / `O-O-O`.
//!
//! Promotion suffixes are not handled.

/// Join and re-case spoken move tokens into SAN text.
pub fn normalize_notation<S: AsRef<str>>(tokens: &[S]) -> String {
    let joined: String = tokens
        .iter()
        .map(|t| t.as_ref().trim())
        .collect::<String>()
        .chars()
        .map(|c| match c {
            'n' | 'r' | 'q' | 'k' | 'o' => c.to_ascii_uppercase(),
            _ => c,
        })
        .collect();

    match joined.as_str() {
        "OO" | "00" => return "O-O".to_string(),
        "OOO" | "000" => return "O-O-O".to_string(),
        _ => {}
    }

    if joined.chars().count() == 3 {
        if let Some(rest) = joined.strip_prefix('b') {
            return format!("B{rest}");
        }
    }
    joined
}
