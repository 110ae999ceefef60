//! Token-set text similarity on a 0–100 scale.
//!
//! Word order and repeated words do not matter, and a text whose words are
//! all contained in the other scores 100. Used to break ties between bank
//! candidates with the same amount.

use std::collections::BTreeSet;

/// Lower-case, keep alphanumerics, split on everything else.
fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalized indel similarity: `100 * (1 - distance / (len_a + len_b))`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(&a, &b);
    100.0 * (2 * lcs) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let join = |set: Vec<&String>| set.into_iter().cloned().collect::<Vec<_>>().join(" ");
    let sect = join(ta.intersection(&tb).collect());
    let only_a = join(ta.difference(&tb).collect());
    let only_b = join(tb.difference(&ta).collect());

    if !sect.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let combine = |rest: &str| {
        if sect.is_empty() {
            rest.to_string()
        } else {
            format!("{sect} {rest}")
        }
    };
    let sect_a = combine(&only_a);
    let sect_b = combine(&only_b);

    let mut best = ratio(&sect_a, &sect_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_a)).max(ratio(&sect, &sect_b));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_reordered() {
        assert_eq!(token_set_ratio("PAGO PROVEEDOR ACME", "acme pago proveedor"), 100.0);
    }

    #[test]
    fn subset_scores_full() {
        assert_eq!(token_set_ratio("ACME", "SPEI ENVIADO ACME SA DE CV"), 100.0);
    }

    #[test]
    fn unrelated_scores_low() {
        let s = token_set_ratio("PAPELERIA", "COMISION MANEJO CUENTA");
        assert!(s < 50.0, "got {s}");
    }

    #[test]
    fn partial_overlap_between() {
        let s = token_set_ratio("RENTA OFICINA ENERO", "RENTA BODEGA FEBRERO");
        assert!(s > 0.0 && s < 100.0, "got {s}");
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(token_set_ratio("", "ACME"), 0.0);
        assert_eq!(token_set_ratio("--", "ACME"), 0.0);
    }

    #[test]
    fn ratio_basics() {
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("ab", "abcd"), 100.0 * 4.0 / 6.0);
    }
}
