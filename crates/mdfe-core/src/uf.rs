//! Federative unit (UF) codes used by the fiscal authority

/// Code used when a UF abbreviation is unknown (São Paulo)
pub const DEFAULT_UF_CODE: u8 = 35;

const UF_CODES: [(&str, u8); 27] = [
    ("AC", 12),
    ("AL", 27),
    ("AP", 16),
    ("AM", 13),
    ("BA", 29),
    ("CE", 23),
    ("DF", 53),
    ("ES", 32),
    ("GO", 52),
    ("MA", 21),
    ("MT", 51),
    ("MS", 50),
    ("MG", 31),
    ("PA", 15),
    ("PB", 25),
    ("PR", 41),
    ("PE", 26),
    ("PI", 22),
    ("RJ", 33),
    ("RN", 24),
    ("RS", 43),
    ("RO", 11),
    ("RR", 14),
    ("SC", 42),
    ("SP", 35),
    ("SE", 28),
    ("TO", 17),
];

/// IBGE numeric code for a UF abbreviation, case-insensitive
#[must_use]
pub fn uf_code(uf: &str) -> Option<u8> {
    let uf = uf.trim();
    UF_CODES
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(uf))
        .map(|&(_, code)| code)
}

/// Like [`uf_code`] but falls back to [`DEFAULT_UF_CODE`]
#[must_use]
pub fn uf_code_or_default(uf: &str) -> u8 {
    uf_code(uf).unwrap_or(DEFAULT_UF_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(uf_code("sp"), Some(35));
        assert_eq!(uf_code(" PR "), Some(41));
        assert_eq!(uf_code("XX"), None);
        assert_eq!(uf_code_or_default("XX"), 35);
        assert_eq!(uf_code_or_default("TO"), 17);
    }
}
