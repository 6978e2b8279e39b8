//! Seeded deterministic primitives for synthetic data
//!
//! Every function here maps a seed string to a value through SHA-256 of the
//! UTF-8 seed, so the same seed always gives the same result on every
//! platform. The integer behind a seed is the first 8 hex digits of the
//! digest. Generators build per-field seeds as `"<salt>:<id>:<field>"` and
//! derive sub-seeds by appending suffixes such as `":d"`.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Environment variable holding the anonymisation salt
pub const SALT_ENV: &str = "ANONYMIZE_SALT";

/// Salt used when [`SALT_ENV`] is not set
pub const DEFAULT_SALT: &str = "default-demo-salt";

/// Letters used by [`stable_letter`]
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z]+").expect("valid identifier separator regex"));

/// Current salt, from the environment or the default
#[must_use]
pub fn salt() -> String {
    std::env::var(SALT_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SALT.to_string())
}

fn digest_hex(seed: &str) -> String {
    format!("{:x}", Sha256::digest(seed.as_bytes()))
}

/// Integer of the first 8 hex digits of the seed's digest
#[must_use]
pub fn stable_hash(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    u64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Pick one of `options`, `None` when there are none
#[must_use]
pub fn stable_choice<'a, T>(seed: &str, options: &'a [T]) -> Option<&'a T> {
    if options.is_empty() {
        return None;
    }
    let index = stable_hash(seed) % options.len() as u64;
    options.get(usize::try_from(index).ok()?)
}

/// Integer in the inclusive range, with reversed bounds swapped
#[must_use]
pub fn stable_randint(min: i64, max: i64, seed: &str) -> i64 {
    let (lo, hi) = if min > max { (max, min) } else { (min, max) };
    let span = hi.abs_diff(lo).saturating_add(1);
    lo.wrapping_add_unsigned(stable_hash(seed) % span)
}

/// Letter of [`ALPHABET`]
#[must_use]
pub fn stable_letter(seed: &str) -> char {
    stable_letter_from(seed, ALPHABET)
}

/// Character of `alphabet`, `'A'` for an empty alphabet
#[must_use]
pub fn stable_letter_from(seed: &str, alphabet: &str) -> char {
    let chars: Vec<char> = alphabet.chars().collect();
    stable_choice(seed, &chars).copied().unwrap_or('A')
}

/// Pick by integer weight
///
/// Negative weights count as zero. When no weight is positive every option is
/// equally likely.
#[must_use]
pub fn stable_weighted_choice<'a, T>(seed: &str, options: &'a [(T, i64)]) -> Option<&'a T> {
    let total: u64 = options.iter().map(|(_, w)| w.max(&0).unsigned_abs()).sum();
    if total == 0 {
        let index = usize::try_from(stable_hash(seed) % options.len().max(1) as u64).ok()?;
        return options.get(index).map(|(v, _)| v);
    }

    let pick = stable_hash(seed) % total;
    let mut acc = 0u64;
    for (value, weight) in options {
        let weight = weight.max(&0).unsigned_abs();
        if acc + weight > pick {
            return Some(value);
        }
        acc += weight;
    }
    options.last().map(|(v, _)| v)
}

/// Shift `original` by a delta in `[min_delta, max_delta]`, never below zero
///
/// The delta fraction comes from the first 12 hex digits of the digest and
/// the sign from the parity of the 13th.
#[must_use]
pub fn stable_jitter_number(original: f64, seed: &str, min_delta: f64, max_delta: f64) -> f64 {
    let hex = digest_hex(seed);
    let fraction = u64::from_str_radix(&hex[..12], 16).unwrap_or_default() as f64 / 0xFFFF_FFFF_FFFF_u64 as f64;
    let delta = min_delta + (max_delta - min_delta) * fraction;
    let negative = u8::from_str_radix(&hex[12..13], 16).unwrap_or_default() % 2 == 1;
    let candidate = if negative { original - delta } else { original + delta };
    candidate.max(0.0)
}

/// Loose numeric parse: comma decimal separator allowed, 0 when unparseable
#[must_use]
pub fn parse_number(text: &str) -> f64 {
    text.trim().replace(',', ".").parse().unwrap_or(0.0)
}

/// [`stable_jitter_number`] over text, keeping the input's decimal places
#[must_use]
pub fn jitter_numeric_str(original: &str, seed: &str, min_delta: f64, max_delta: f64) -> String {
    let value = stable_jitter_number(parse_number(original), seed, min_delta, max_delta);
    let decimals = original.rsplit_once('.').map_or(0, |(_, frac)| frac.chars().count());
    format!("{value:.decimals$}")
}

/// Shift an integer by a seeded delta and clamp it to `[min_value, max_value]`
///
/// The delta uses sub-seed `":d"`, the sign `":s"`.
#[must_use]
pub fn jitter_integer(original: &str, seed: &str, delta: (i64, i64), min_value: i64, max_value: i64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let original = parse_number(original).trunc() as i64;
    let step = stable_randint(delta.0, delta.1, &format!("{seed}:d"));
    let candidate = if stable_randint(0, 1, &format!("{seed}:s")) == 0 {
        original.saturating_add(step)
    } else {
        original.saturating_sub(step)
    };
    candidate.max(min_value).min(max_value)
}

/// Upper-case identifier with non-alphanumeric runs turned into `_`
#[must_use]
pub fn normalize_identifier(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return "UNKNOWN".into();
    };
    let joined = NON_ALNUM.replace_all(text.trim(), "_");
    let id = joined.trim_matches('_').to_uppercase();
    if id.is_empty() { "UNKNOWN".into() } else { id }
}

/// FTTB code: county, locality initial (`X` when blank), 4-digit sequence
#[must_use]
pub fn format_fttb_code(locality: Option<&str>, seq: u32, county: &str) -> String {
    let initial = locality
        .and_then(|l| l.trim().chars().next())
        .map_or_else(|| "X".to_string(), |c| c.to_uppercase().collect());
    format!("{county}{initial}{seq:04}")
}

/// Excel-style column letters, `1 -> A`, `27 -> AA`
#[must_use]
pub fn number_to_letters(n: u64) -> String {
    if n == 0 {
        return "A".into();
    }
    let mut n = n;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    out.iter().rev().collect()
}

/// Staircase label in letters only
///
/// Digit runs become [`number_to_letters`], letters are upper-cased and
/// anything else is dropped.
#[must_use]
pub fn digits_to_letters(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return "A".into();
    };
    let mut out = String::new();
    let mut digits = String::new();
    let flush = |digits: &mut String, out: &mut String| {
        if !digits.is_empty() {
            out.push_str(&number_to_letters(digits.parse().unwrap_or(0)));
            digits.clear();
        }
    };
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            flush(&mut digits, &mut out);
            if ch.is_alphabetic() {
                out.extend(ch.to_uppercase());
            }
        }
    }
    flush(&mut digits, &mut out);
    if out.is_empty() { "A".into() } else { out }
}

/// Record id `DGI-<year_month>-<seq:06>-<2 check letters>`
#[must_use]
pub fn compute_digi_id(year_month: &str, seq: u32, salt: &str) -> String {
    let hex = digest_hex(&format!("{year_month}:{seq}:{salt}"));
    let check = u32::from_str_radix(&hex[..4], 16).unwrap_or_default() % 676;
    let first = char::from(b'A' + (check / 26) as u8);
    let second = char::from(b'A' + (check % 26) as u8);
    format!("DGI-{year_month}-{seq:06}-{first}{second}")
}
