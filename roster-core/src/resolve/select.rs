//! Disambiguation between several candidates

use super::error::ResolveError;
use super::interaction::Interaction;

/// Maximum number of candidates shown in an interactive prompt
pub const MAX_DISPLAYED_MATCHES: usize = 20;

/// One entry of a selection prompt
#[derive(Debug, Clone)]
pub struct Choice {
    pub name: String,
    pub detail: String,
}

/// Pick one of `choices`
///
/// Returns `Ok(None)` when several choices exist and nobody can be asked,
/// so the caller can raise its own ambiguity error. Choices are expected
/// in display order.
pub fn disambiguate(
    interaction: &dyn Interaction,
    header: &str,
    choices: &[Choice],
) -> Result<Option<usize>, ResolveError> {
    match choices.len() {
        0 => return Ok(None),
        1 => return Ok(Some(0)),
        _ => {}
    }

    if !interaction.is_interactive() {
        return Ok(None);
    }

    let shown = &choices[..choices.len().min(MAX_DISPLAYED_MATCHES)];
    let lines = prompt_lines(header, shown, choices.len());

    let input = interaction
        .prompt(&lines, "Select:")
        .map_err(ResolveError::Interaction)?;

    let names: Vec<&str> = shown.iter().map(|c| c.name.as_str()).collect();
    parse_selection(&input, &names)
        .map(Some)
        .ok_or(ResolveError::InvalidSelection { input })
}

fn prompt_lines(header: &str, shown: &[Choice], total: usize) -> Vec<String> {
    let width = shown.len().to_string().len();
    let mut lines = vec![header.to_string(), String::new()];
    for (i, choice) in shown.iter().enumerate() {
        if choice.detail.is_empty() {
            lines.push(format!("  {:>width$}. {}", i + 1, choice.name));
        } else {
            lines.push(format!("  {:>width$}. {}  {}", i + 1, choice.name, choice.detail));
        }
    }
    if total > shown.len() {
        lines.push(format!(
            "  ... and {} more (refine the query to see them)",
            total - shown.len()
        ));
    }
    lines.push(String::new());
    lines
}

/// Interpret a selection answer against the displayed names
///
/// Accepts a 1-based index, an exact case-insensitive name, or a
/// case-insensitive substring of exactly one name.
pub fn parse_selection(input: &str, names: &[&str]) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(n) = input.parse::<usize>() {
        return (1..=names.len()).contains(&n).then(|| n - 1);
    }

    let lower = input.to_lowercase();
    if let Some(i) = names.iter().position(|n| n.to_lowercase() == lower) {
        return Some(i);
    }

    let mut hits = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&lower));
    match (hits.next(), hits.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}
