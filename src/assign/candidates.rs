//! Candidate abbreviations for one name, in the order they are tried.

use super::AssignPolicy;

/// Names of clock faces (`clock1`, `clock130`, ...).
pub const CLOCK_PREFIX: &str = "clock";

/// Names of national flags (`flag_fr`, ...).
pub const FLAG_PREFIX: &str = "flag_";

/// Clock token kept whole even though it ends in a zero.
const CLOCK_TEN: &str = "c10";

fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn last_char(s: &str) -> String {
    s.chars().last().map(String::from).unwrap_or_default()
}

/// Candidate abbreviations for `name`, most preferred first.
///
/// Flags and manual alternates yield a single candidate. Clock faces yield
/// their compressed token ahead of the general candidates.
pub fn candidates(name: &str, policy: &AssignPolicy) -> Vec<String> {
    if let Some(alt) = policy.alternates.get(name) {
        return vec![alt.clone()];
    }

    let mut out = Vec::with_capacity(9);
    if let Some(rest) = name.strip_prefix(CLOCK_PREFIX) {
        let token = format!("c{rest}");
        if token == CLOCK_TEN {
            out.push(token);
        } else {
            out.push(token.trim_end_matches('0').to_string());
        }
    } else if let Some(rest) = name.strip_prefix(FLAG_PREFIX) {
        return vec![prefix(&format!("fl{rest}"), 4)];
    }

    let words: Vec<&str> = name.split('_').filter(|w| !w.is_empty()).collect();
    let initials: String = words.iter().filter_map(|w| w.chars().next()).collect();
    let first = words.first().copied().unwrap_or_default();
    let tail: String = words.iter().skip(1).filter_map(|w| w.chars().next()).collect();

    out.push(prefix(&initials, 2));
    out.push(prefix(&initials, 3));
    out.push(initials.clone());
    out.push(format!("{}{tail}", prefix(first, 2)));
    out.push(format!("{}{}{tail}", prefix(first, 1), last_char(first)));
    out.push(format!("{}{}{tail}", prefix(first, 2), last_char(first)));
    out.push(format!("{}{tail}", prefix(first, 3)));

    let consonants: String = name.chars().filter(|c| !"aeiou".contains(*c)).collect();
    let stripped = prefix(&consonants, 3);
    out.push(if stripped.is_empty() { initials } else { stripped });

    out.retain(|c| !c.is_empty());
    out
}
