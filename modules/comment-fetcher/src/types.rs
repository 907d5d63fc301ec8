use std::path::PathBuf;

/// Comment ordering requested from the downloader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    Popular,
    #[default]
    Recent,
}

impl SortMode {
    /// Numeric code the downloader expects for `--sort`.
    pub fn code(&self) -> u8 {
        match self {
            SortMode::Popular => 0,
            SortMode::Recent => 1,
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortMode::Popular => write!(f, "popular"),
            SortMode::Recent => write!(f, "recent"),
        }
    }
}

/// One downloader invocation. The payload is written to `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub item_id: String,
    pub limit: u32,
    pub sort: SortMode,
    pub locale: Option<String>,
    pub output: PathBuf,
}

impl FetchRequest {
    /// Per-item downloader flags.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--youtubeid".to_string(),
            self.item_id.clone(),
            "--output".to_string(),
            self.output.display().to_string(),
            "--limit".to_string(),
            self.limit.to_string(),
            "--sort".to_string(),
            self.sort.code().to_string(),
            "--pretty".to_string(),
        ];
        if let Some(ref locale) = self.locale {
            args.push("--language".to_string());
            args.push(locale.clone());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(locale: Option<&str>) -> FetchRequest {
        FetchRequest {
            item_id: "abc123".to_string(),
            limit: 50,
            sort: SortMode::Popular,
            locale: locale.map(String::from),
            output: PathBuf::from("/tmp/out.json"),
        }
    }

    #[test]
    fn args_carry_limit_sort_and_output() {
        let args = request(None).args();
        assert_eq!(
            args,
            vec![
                "--youtubeid",
                "abc123",
                "--output",
                "/tmp/out.json",
                "--limit",
                "50",
                "--sort",
                "0",
                "--pretty"
            ]
        );
    }

    #[test]
    fn locale_is_appended_when_present() {
        let args = request(Some("en")).args();
        assert_eq!(&args[args.len() - 2..], ["--language", "en"]);
    }

    #[test]
    fn sort_codes() {
        assert_eq!(SortMode::Popular.code(), 0);
        assert_eq!(SortMode::Recent.code(), 1);
        assert_eq!(SortMode::default(), SortMode::Recent);
    }
}
