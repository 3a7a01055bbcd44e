//! CPF / CNPJ helpers

/// Keep ASCII digits only
#[must_use]
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 {
        0
    } else {
        11 - rest
    }
}

fn to_digits(text: &str, expected_len: usize) -> Option<Vec<u32>> {
    let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
    (digits.len() == expected_len && !all_same(&digits)).then_some(digits)
}

/// Validate an individual taxpayer number (11 digits, mod-11 check digits).
/// Formatting characters are ignored.
#[must_use]
pub fn is_valid_cpf(cpf: &str) -> bool {
    let Some(d) = to_digits(cpf, 11) else {
        return false;
    };
    let first = check_digit(&d[..9], &[10, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = check_digit(&d[..10], &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    d[9] == first && d[10] == second
}

/// Validate a company number (14 digits, mod-11 check digits).
/// Formatting characters are ignored.
#[must_use]
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let Some(d) = to_digits(cnpj, 14) else {
        return false;
    };
    let first = check_digit(&d[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = check_digit(&d[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    d[12] == first && d[13] == second
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("52998224724"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
    }

    #[test]
    fn cnpj_check_digits() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00000000000000"));
    }

    #[test]
    fn strips_formatting() {
        assert_eq!(digits_only("123.456.789-09"), "12345678909");
        assert_eq!(digits_only("01310-100"), "01310100");
    }
}
