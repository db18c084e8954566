//! Folding of free-form item names into catalog keys.
//!
//! Operators type item names with accents, mixed case and assorted separators
//! ("Cadeira de Jantar", "fogão", "cama/box"). Every lookup goes through
//! [`normalize_identifier`] so that all of these resolve to the same key.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Removes diacritics by decomposing and dropping combining marks.
pub fn strip_diacritics(raw: &str) -> String {
    raw.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalizes an identifier into its catalog key.
///
/// # Examples
/// ```
/// use box_sizer::identifier::normalize_identifier;
///
/// assert_eq!(normalize_identifier("Cadeira de Jantar"), "cadeira_de_jantar");
/// assert_eq!(normalize_identifier(" Fogão "), "fogao");
/// assert_eq!(normalize_identifier("Cama/Box"), "cama_box");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    let folded = strip_diacritics(&raw.trim().to_lowercase());

    let kept: String = folded
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || c.is_whitespace()
                || matches!(c, '-' | '_' | '/')
        })
        .map(|c| if matches!(c, '-' | '/') { ' ' } else { c })
        .collect();

    // Whitespace runs become a single underscore; existing underscores stay.
    let mut key = String::with_capacity(kept.len());
    let mut in_whitespace = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                key.push('_');
            }
            in_whitespace = true;
        } else {
            key.push(c);
            in_whitespace = false;
        }
    }

    key.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_joins_words() {
        assert_eq!(normalize_identifier("Sofa 3 Lugares"), "sofa_3_lugares");
        assert_eq!(normalize_identifier("TV"), "tv");
    }

    #[test]
    fn strips_accents() {
        assert_eq!(normalize_identifier("Colchão de Solteiro"), "colchao_de_solteiro");
        assert_eq!(normalize_identifier("máquina de lavar"), "maquina_de_lavar");
        assert_eq!(strip_diacritics("Disponível"), "Disponivel");
    }

    #[test]
    fn separators_collapse_to_single_underscore() {
        assert_eq!(normalize_identifier("cama - box"), "cama_box");
        assert_eq!(normalize_identifier("cama/box"), "cama_box");
        assert_eq!(normalize_identifier("  mesa\t de \n jantar  "), "mesa_de_jantar");
    }

    #[test]
    fn removes_punctuation() {
        assert_eq!(normalize_identifier("cadeira (escritório)!"), "cadeira_escritorio");
        assert_eq!(normalize_identifier("rack."), "rack");
    }

    #[test]
    fn existing_underscores_are_kept() {
        assert_eq!(normalize_identifier("caixa_media"), "caixa_media");
        assert_eq!(normalize_identifier("_caixa_"), "caixa");
    }

    #[test]
    fn empty_and_symbol_only_inputs_fold_to_empty_key() {
        assert_eq!(normalize_identifier(""), "");
        assert_eq!(normalize_identifier("  ?!  "), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["Cadeira de Jantar", "Fogão", "cama/box", "Sofa 2 lugares"] {
            let once = normalize_identifier(raw);
            assert_eq!(normalize_identifier(&once), once);
        }
    }
}
