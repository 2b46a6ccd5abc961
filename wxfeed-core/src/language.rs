/// Prefix → provider language code pairs.
pub type LanguageMapping = &'static [(&'static str, &'static str)];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Resolve the provider language for a locale such as `de-DE`, `de_DE` or `zh-TW`.
///
/// The locale is normalized to `language-COUNTRY` and matched against each
/// prefix in `mapping`; without a match the result is [`DEFAULT_LANGUAGE`].
pub fn resolve_language_code(locale: &str, mapping: LanguageMapping) -> &'static str {
    let selector = normalize_locale(locale);

    mapping
        .iter()
        .find(|(prefix, _)| selector.starts_with(prefix))
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_LANGUAGE)
}

fn normalize_locale(locale: &str) -> String {
    // drop encoding/modifier suffixes like `.UTF-8` or `@euro`
    let locale = locale.split(['.', '@']).next().unwrap_or_default();
    let mut parts = locale.split(['-', '_']);
    let language = parts.next().unwrap_or_default().to_lowercase();
    let country = parts.next().unwrap_or_default().to_uppercase();

    format!("{language}-{country}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: LanguageMapping = &[("de-", "de"), ("uk-", "ua"), ("zh-CN", "zh_cn")];

    #[test]
    fn prefix_selects_language() {
        assert_eq!(resolve_language_code("de-AT", MAPPING), "de");
        assert_eq!(resolve_language_code("uk-UA", MAPPING), "ua");
    }

    #[test]
    fn country_matters_for_full_keys() {
        assert_eq!(resolve_language_code("zh-CN", MAPPING), "zh_cn");
        assert_eq!(resolve_language_code("zh-TW", MAPPING), "en");
    }

    #[test]
    fn posix_style_locales_are_normalized() {
        assert_eq!(resolve_language_code("zh_cn.UTF-8", MAPPING), "zh_cn");
        assert_eq!(resolve_language_code("de", MAPPING), "de");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        assert_eq!(resolve_language_code("ja-JP", MAPPING), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language_code("", MAPPING), DEFAULT_LANGUAGE);
    }
}
