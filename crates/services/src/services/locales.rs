//! Supported UI locales and `Accept-Language` negotiation.

use serde::Serialize;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub code: &'static str,
    pub name: &'static str,
    pub rtl: bool,
}

const fn ltr(code: &'static str, name: &'static str) -> Locale {
    Locale {
        code,
        name,
        rtl: false,
    }
}

const fn rtl(code: &'static str, name: &'static str) -> Locale {
    Locale {
        code,
        name,
        rtl: true,
    }
}

pub static LOCALES: &[Locale] = &[
    ltr("en", "English"),
    ltr("hi", "Hindi"),
    ltr("bn", "Bengali"),
    ltr("mr", "Marathi"),
    ltr("te", "Telugu"),
    ltr("ta", "Tamil"),
    ltr("gu", "Gujarati"),
    rtl("ur", "Urdu"),
    ltr("kn", "Kannada"),
    ltr("or", "Odia"),
    ltr("ml", "Malayalam"),
    ltr("pa", "Punjabi"),
    ltr("as", "Assamese"),
    ltr("mai", "Maithili"),
    ltr("sat", "Santali"),
    rtl("ks", "Kashmiri"),
    ltr("ne", "Nepali"),
    rtl("sd", "Sindhi"),
    ltr("kok", "Konkani"),
    ltr("dgo", "Dogri"),
    ltr("mni", "Manipuri (Meitei)"),
    ltr("brx", "Bodo"),
    ltr("sa", "Sanskrit"),
];

/// Look up a supported locale by exact code.
pub fn lookup(code: &str) -> Option<&'static Locale> {
    LOCALES.iter().find(|l| l.code == code)
}

/// Canonical `'static` code for `code`, case-insensitively.
pub fn find(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_lowercase();
    lookup(&code).map(|l| l.code)
}

/// Display name for a code, falling back to the code itself for unknown values.
pub fn display_name(code: &str) -> &str {
    lookup(code).map(|l| l.name).unwrap_or(code)
}

/// Pick the best supported locale from an `Accept-Language` header value.
///
/// Tags are ranked by their `q` weight (missing = 1.0, ties keep header order); `hi-IN` matches `hi`.
pub fn negotiate(accept_language: &str) -> Option<&'static str> {
    let mut ranked: Vec<(usize, f32, &str)> = accept_language
        .split(',')
        .enumerate()
        .filter_map(|(index, part)| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            (weight > 0.0).then_some((index, weight, tag))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked.into_iter().find_map(|(_, _, tag)| {
        find(tag).or_else(|| tag.split(['-', '_']).next().and_then(find))
    })
}
