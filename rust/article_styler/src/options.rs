use serde::Deserialize;

/// Fixed strings of the generated chrome.
///
/// Defaults reproduce the Indonesian reader the styled documents were first
/// produced for. Missing keys in a JSON options file fall back to these.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    /// `lang` attribute of the generated `<html>`.
    pub lang: String,
    pub nav_title: String,
    pub toggle_label: String,
    /// Title used when the input has no `<title>` and no heading.
    pub untitled: String,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            lang: "id".to_string(),
            nav_title: "📚 Daftar Isi".to_string(),
            toggle_label: "Sembunyikan".to_string(),
            untitled: "Untitled Article".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: StyleOptions =
            serde_json::from_str(r#"{"lang":"en","toggleLabel":"Hide"}"#).unwrap();
        assert_eq!(opts.lang, "en");
        assert_eq!(opts.toggle_label, "Hide");
        assert_eq!(opts.untitled, "Untitled Article");
    }
}
