use unicode_normalization::UnicodeNormalization;

/// Strip diacritics and replace anything non-alphanumeric with `_`.
///
/// Mandatory before a name reaches a `Content-Disposition` header:
/// unescaped non-ASCII bytes are illegal there and must not reach the
/// transport layer.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{20D0}'..='\u{20FF}')
}

/// Format an 11-digit CPF-style identifier as `123.456.789-01`.
/// Anything else is returned as-is.
pub fn format_national_id(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return raw.to_string();
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Mask a CPF-style identifier for evidence reports: first group and check
/// digits stay visible, middle groups are starred.
pub fn mask_national_id(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return "***".to_string();
    }
    format!("{}.***.***-{}", &digits[0..3], &digits[9..11])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_diacritics_and_symbols() {
        assert_eq!(sanitize_filename("Contrato de Adesão.pdf"), "Contrato_de_Adesao_pdf");
        assert_eq!(sanitize_filename("ação/çü 2024"), "acao_cu_2024");
    }

    #[test]
    fn sanitize_keeps_plain_ascii() {
        assert_eq!(sanitize_filename("report2024"), "report2024");
    }

    #[test]
    fn formats_eleven_digit_ids() {
        assert_eq!(format_national_id("12345678901"), "123.456.789-01");
        assert_eq!(format_national_id("123.456.789-01"), "123.456.789-01");
    }

    #[test]
    fn format_leaves_other_lengths_alone() {
        assert_eq!(format_national_id("AB-12"), "AB-12");
    }

    #[test]
    fn masks_middle_groups() {
        assert_eq!(mask_national_id("12345678901"), "123.***.***-01");
        assert_eq!(mask_national_id("garbage"), "***");
    }
}
