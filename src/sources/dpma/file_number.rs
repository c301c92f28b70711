//! DPMA file numbers (Aktenzeichen) and their check digit.

use regex::Regex;
use std::sync::LazyLock;

/// German numbers in the 12-digit format introduced in 2004, where the
/// published number and the file number coincide. `10` marks patent
/// applications, `20` utility models. An optional kind code may follow.
static DERIVABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DE((?:10|20)\d{10})(?:[A-Z]\d?)?$").unwrap());

/// Mod-11 check digit of a file number.
///
/// 12-digit numbers are weighted 2..=9 then 2..=5 from the left, older
/// shorter numbers 2, 3, 4, .. from the right. Remainders yielding 10 or 11
/// map to 0.
pub fn check_digit(digits: &str) -> Option<u32> {
    let values = digits
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()?;
    if values.is_empty() {
        return None;
    }

    let sum: u32 = if values.len() == 12 {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| value * (2 + (index as u32 % 8)))
            .sum()
    } else {
        values
            .iter()
            .rev()
            .enumerate()
            .map(|(index, value)| value * (2 + index as u32))
            .sum()
    };

    Some(match 11 - (sum % 11) {
        10 | 11 => 0,
        digit => digit,
    })
}

/// Derives the file reference for numbers whose reference is computable
/// without asking the register. Returns `None` for every other number.
pub fn derive_file_reference(document_number: &str) -> Option<String> {
    let captures = DERIVABLE_RE.captures(document_number)?;
    let digits = &captures[1];
    let check = check_digit(digits)?;
    Some(format!("{digits}{check}"))
}
