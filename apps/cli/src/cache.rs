use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use sekretar_core::Provider;

/// Get the cache directory for a given transcript file
pub fn get_cache_dir(transcript_key: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    transcript_key.hash(&mut hasher);
    let key_hash = hasher.finish();

    get_root_cache_dir().join(key_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("sekretar")
}

/// Get the path for a cached report file (provider and language aware)
pub fn get_report_path(cache_dir: &Path, provider: &Provider, lang: &str) -> PathBuf {
    let provider_name = match provider {
        Provider::Grok => "grok",
        Provider::Openai => "openai",
        Provider::Gemini => "gemini",
    };
    cache_dir.join(format!("report_{}_{}.json", provider_name, lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_derives_from_the_path_string() {
        let first = get_cache_dir("/recordings/standup.json");
        let again = get_cache_dir("/recordings/standup.json");
        let other = get_cache_dir("/recordings/retro.json");
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn report_files_are_split_by_provider_and_language() {
        let dir = Path::new("/cache/42");
        assert_eq!(
            get_report_path(dir, &Provider::Grok, "en"),
            PathBuf::from("/cache/42/report_grok_en.json")
        );
        assert_eq!(
            get_report_path(dir, &Provider::Gemini, "uk"),
            PathBuf::from("/cache/42/report_gemini_uk.json")
        );
    }
}
