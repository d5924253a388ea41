use crate::shared::types::Lang;

/// Detect the source language of `text` from its script.
///
/// Checked in priority order: CJK ideographs win over kana, so mixed
/// kanji/kana text resolves to Chinese the way the widget always did.
/// Anything without CJK, kana or hangul falls back to English.
pub fn detect_language(text: &str) -> Lang {
    let has_chinese = text
        .chars()
        .any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c)); // CJK Unified Ideographs

    let has_japanese = text.chars().any(|c| {
        ('\u{3040}'..='\u{309F}').contains(&c) || // Hiragana
        ('\u{30A0}'..='\u{30FF}').contains(&c) // Katakana
    });

    let has_korean = text
        .chars()
        .any(|c| ('\u{AC00}'..='\u{D7AF}').contains(&c)); // Hangul Syllables

    if has_chinese {
        Lang::Zh
    } else if has_japanese {
        Lang::Ja
    } else if has_korean {
        Lang::Ko
    } else {
        Lang::En
    }
}
