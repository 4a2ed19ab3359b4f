//! Text cleaning shared by preprocessing, training and inference.
//!
//! Every piece of text that reaches the vectorizer goes through [`normalize`],
//! so the model never sees text cleaned one way at training time and another
//! way at prediction time.

/// Cleans a single free-form field: lowercases, removes ASCII punctuation
/// and trims surrounding whitespace.
///
/// ```
/// use spendcat::clean_text;
///
/// assert_eq!(clean_text("  AMAZON.COM*Mktp US "), "amazoncommktp us");
/// ```
pub fn clean_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Joins a transaction description and an optional merchant name with a
/// single space and cleans the result with [`clean_text`].
///
/// An absent merchant name behaves exactly like an empty one.
///
/// ```
/// use spendcat::normalize;
///
/// assert_eq!(normalize("STARBUCKS #123", Some("Starbucks")), "starbucks 123 starbucks");
/// assert_eq!(normalize("Rent ", Some("")), normalize("Rent ", None));
/// ```
pub fn normalize(primary: &str, secondary: Option<&str>) -> String {
    let combined = format!("{} {}", primary, secondary.unwrap_or_default());
    clean_text(&combined)
}
