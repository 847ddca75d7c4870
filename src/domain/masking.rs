/// Replaces every character between the first four and the last four with
/// `mask`. Strings shorter than nine characters come back unchanged.
pub fn mask_card_number(input: &str, mask: char) -> String {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    chars
        .into_iter()
        .enumerate()
        .map(|(i, c)| if i >= 4 && i + 4 < len { mask } else { c })
        .collect()
}
