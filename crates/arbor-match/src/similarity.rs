//! Jaro and Jaro-Winkler string similarity.
//!
//! Both functions return a value in `[0, 1]`: identical strings score `1`,
//! strings with no matching characters score `0`. Two empty strings are
//! identical; an empty string against a non-empty one scores `0`.

/// Winkler prefix scale.
const PREFIX_SCALE: f64 = 0.1;

/// Longest common prefix considered by the Winkler adjustment.
const MAX_PREFIX: usize = 4;

/// Jaro similarity of two strings, computed over Unicode scalar values.
pub fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);

    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Count matched characters that appear in a different order.
    let mut transpositions = 0usize;
    let mut k = 0usize;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if *ca != b[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let t = (transpositions / 2) as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro-Winkler similarity: Jaro boosted by the length of the common prefix
/// (up to four characters).
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let j = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();
    (j + prefix as f64 * PREFIX_SCALE * (1.0 - j)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(jaro_winkler("a", "a"), 1.0);
        assert_eq!(jaro_winkler("catalog", "catalog"), 1.0);
        assert_eq!(jaro_winkler("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(jaro_winkler("a", "b"), 0.0);
        assert_eq!(jaro_winkler("abc", "xyz"), 0.0);
        assert_eq!(jaro_winkler("", "abc"), 0.0);
    }

    #[test]
    fn classic_reference_values() {
        assert!(close(jaro("MARTHA", "MARHTA"), 0.944));
        assert!(close(jaro_winkler("MARTHA", "MARHTA"), 0.961));
        assert!(close(jaro_winkler("DWAYNE", "DUANE"), 0.84));
        assert!(close(jaro_winkler("DIXON", "DICKSONX"), 0.813));
    }

    #[test]
    fn similar_names_outrank_different_names() {
        let near = jaro_winkler("John", "Jon");
        let far = jaro_winkler("John", "Jake");
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        for (a, b) in [("ab", "ba"), ("aaaa", "aaab"), ("héllo", "hello"), ("x", "xxxxxxxx")] {
            let s = jaro_winkler(a, b);
            assert!((0.0..=1.0).contains(&s), "{a} vs {b} gave {s}");
        }
    }
}
