const WORD_API: &str = "https://random-word-api.herokuapp.com/word?number=3";

/// How long a Create waits for a suggestion before using a generated name.
pub const SUGGEST_TIMEOUT_MS: u32 = 4_000;

pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Join random words into a display name ("red fox jumps" -> "Red Fox Jumps").
pub fn words_to_name(words: &[String]) -> String {
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask the word service for a random marker name.
pub async fn suggest_name() -> Result<String, String> {
    let resp = reqwest::Client::new()
        .get(WORD_API)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let words: Vec<String> = resp.json().await.map_err(|e| e.to_string())?;
    let name = words_to_name(&words);
    if name.is_empty() {
        return Err("Word service returned no words".to_string());
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("fox"), "Fox");
        assert_eq!(title_case("Fox"), "Fox");
        assert_eq!(title_case("éclair"), "Éclair");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_words_to_name() {
        let words = vec!["red".to_string(), "fox".to_string(), "jumps".to_string()];
        assert_eq!(words_to_name(&words), "Red Fox Jumps");
    }

    #[test]
    fn test_words_to_name_skips_empty() {
        let words = vec!["".to_string(), "owl".to_string()];
        assert_eq!(words_to_name(&words), "Owl");
        assert_eq!(words_to_name(&[]), "");
    }

    #[test]
    fn test_word_list_deserializes() {
        let words: Vec<String> = serde_json::from_str(r#"["alpha","beta","gamma"]"#).unwrap();
        assert_eq!(words_to_name(&words), "Alpha Beta Gamma");
    }
}
