fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }
    row[b_chars.len()]
}

fn distance(input: &str, candidate: &str) -> Option<usize> {
    let a = normalize(input);
    let b = normalize(candidate);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    Some(edit_distance(&a, &b))
}

fn tolerance(input: &str) -> usize {
    match normalize(input).len() {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        n => ((n as f32) * 0.35).floor().max(3.0) as usize,
    }
}

/// Closest candidates to `input`, best first.
pub fn suggest(input: &str, candidates: &[String], limit: usize) -> Vec<String> {
    let allowed = tolerance(input);
    if allowed == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .filter_map(|candidate| {
            distance(input, candidate)
                .filter(|score| *score <= allowed)
                .map(|score| (score, candidate))
        })
        .collect();
    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.len().cmp(&b.1.len()))
            .then_with(|| a.1.cmp(b.1))
    });
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, candidate)| candidate.clone())
        .collect()
}
