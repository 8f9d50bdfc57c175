use serde::{Deserialize, Serialize};

/// Display locale. Affects only derived text (the DO label and combination
/// outcome label selection), never the persisted values of other types.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Et,
}

impl Locale {
    /// Fixed label written into DO-type cells by the sibling cascade.
    pub fn do_label(&self) -> &'static str {
        match self {
            Locale::En => "Do",
            Locale::Et => "Kas",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "et" => Ok(Locale::Et),
            _ => Err(format!("Unknown locale: '{}'. Expected one of: en, et", s)),
        }
    }
}

/// Reference to a validation inside a combination pin.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRef {
    pub id: i64,
}

/// Pins one validation id to one expected answer value.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCombination {
    #[serde(rename = "validationResponse")]
    pub validation: ValidationRef,
    pub validation_value: String,
}

/// A named outcome selected when a row's answers satisfy every pinned
/// (validation, value) pair.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCombinationResult {
    pub id: i64,
    pub name_et: Option<String>,
    pub name_en: Option<String>,
    pub result_et: Option<String>,
    pub result_en: Option<String>,
    #[serde(default)]
    pub validation_combinations: Vec<ValidationCombination>,
}

impl ValidationCombinationResult {
    /// Localized outcome label: the name for the locale, falling back to
    /// the result text, then to the empty string.
    pub fn label(&self, locale: Locale) -> String {
        let (name, result) = match locale {
            Locale::Et => (&self.name_et, &self.result_et),
            Locale::En => (&self.name_en, &self.result_en),
        };
        name.clone()
            .or_else(|| result.clone())
            .unwrap_or_default()
    }
}
