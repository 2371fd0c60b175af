//! Text and wildcard matching utilities.

// ---------------------------------------------------------------------------
// Wildcard matching
// ---------------------------------------------------------------------------

/// Matches a pattern with wildcards (* and ?) against a whole candidate string.
pub fn wildcard_matches(pattern: &str, candidate: &str) -> bool {
    let pattern_chars = pattern.chars().collect::<Vec<_>>();
    let candidate_chars = candidate.chars().collect::<Vec<_>>();
    wildcard_matches_chars(&pattern_chars, &candidate_chars)
}

/// Matches a pattern anchored at the start of the candidate only.
///
/// `foo` matches `foobar` but not `barfoo`. Equivalent to the regular
/// expression `^foo` after wildcard translation.
pub fn prefix_wildcard_matches(pattern: &str, candidate: &str) -> bool {
    let mut pattern_chars = pattern.chars().collect::<Vec<_>>();
    pattern_chars.push('*');
    let candidate_chars = candidate.chars().collect::<Vec<_>>();
    wildcard_matches_chars(&pattern_chars, &candidate_chars)
}

fn wildcard_matches_chars(pattern_chars: &[char], candidate_chars: &[char]) -> bool {
    let mut pattern_index = 0usize;
    let mut candidate_index = 0usize;
    let mut star_index: Option<usize> = None;
    let mut star_candidate_index = 0usize;

    while candidate_index < candidate_chars.len() {
        if pattern_index < pattern_chars.len()
            && (pattern_chars[pattern_index] == '?'
                || pattern_chars[pattern_index] == candidate_chars[candidate_index])
        {
            pattern_index += 1;
            candidate_index += 1;
            continue;
        }

        if pattern_index < pattern_chars.len() && pattern_chars[pattern_index] == '*' {
            star_index = Some(pattern_index);
            pattern_index += 1;
            star_candidate_index = candidate_index;
            continue;
        }

        if let Some(last_star_index) = star_index {
            pattern_index = last_star_index + 1;
            star_candidate_index += 1;
            candidate_index = star_candidate_index;
            continue;
        }

        return false;
    }

    while pattern_index < pattern_chars.len() && pattern_chars[pattern_index] == '*' {
        pattern_index += 1;
    }

    pattern_index == pattern_chars.len()
}
