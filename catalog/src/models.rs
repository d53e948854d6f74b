use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Every system compared on the page, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "Clean")]
    Clean,
    #[serde(rename = "Noisy")]
    Noisy,
    #[serde(rename = "SGMSEP")]
    Sgmsep,
    #[serde(rename = "VPIDM")]
    Vpidm,
    #[serde(rename = "FLOWSE")]
    Flowse,
    #[serde(rename = "VPVID")]
    Vpvid,
    #[serde(rename = "VPVID-PC")]
    VpvidPc,
    #[serde(rename = "VPVID-ODE")]
    VpvidOde,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Clean,
        Method::Noisy,
        Method::Sgmsep,
        Method::Vpidm,
        Method::Flowse,
        Method::Vpvid,
        Method::VpvidPc,
        Method::VpvidOde,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Noisy => "Noisy",
            Self::Sgmsep => "SGMSEP",
            Self::Vpidm => "VPIDM",
            Self::Flowse => "FLOWSE",
            Self::Vpvid => "VPVID",
            Self::VpvidPc => "VPVID-PC",
            Self::VpvidOde => "VPVID-ODE",
        }
    }

    /// Directory name holding this method's files.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Noisy => "noisy",
            Self::Sgmsep => "sgmsep",
            Self::Vpidm => "vpidm",
            Self::Flowse => "flowse",
            Self::Vpvid => "vpvid_sde",
            Self::VpvidPc => "vpvid_sdec",
            Self::VpvidOde => "vpvid_ode",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s) || m.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown method: {}", s))
    }
}

/// Media reference as written into the page: a site-relative path or an
/// absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Decodes a site-relative reference into the file path a browser would
    /// fetch, relative to the site root.
    ///
    /// Rejects references that could not be served from under the site root
    /// as written: absolute paths, `.`/`..` segments, raw `?`/`#`, and
    /// separators smuggled in through percent escapes.
    pub fn local_path(&self) -> Result<PathBuf, String> {
        let reference = self.0.as_str();
        if self.is_remote() {
            return Err("remote reference".to_string());
        }
        if reference.is_empty() {
            return Err("empty reference".to_string());
        }
        if reference.starts_with('/') || reference.starts_with('\\') {
            return Err("absolute path".to_string());
        }
        if reference.contains(['?', '#']) {
            return Err("unescaped '?' or '#'".to_string());
        }
        if reference.contains(['\\', ':']) {
            return Err("unescaped '\\' or ':'".to_string());
        }

        let mut path = PathBuf::new();
        for segment in reference.split('/') {
            let decoded = urlencoding::decode(segment)
                .map_err(|_| format!("segment {segment:?} is not UTF-8 once decoded"))?;
            match decoded.as_ref() {
                "" => return Err("empty path segment".to_string()),
                "." | ".." => return Err(format!("{decoded:?} segment")),
                s if s.contains(['/', '\\']) => {
                    return Err(format!("segment {segment:?} encodes a path separator"))
                }
                s => path.push(s),
            }
        }
        Ok(path)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub method: Method,
    pub audio: AssetRef,
    pub spectrogram: AssetRef,
}

/// One utterance and its rendition by each method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    pub entries: Vec<SampleEntry>,
}

impl Example {
    pub fn entry(&self, method: Method) -> Option<&SampleEntry> {
        self.entries.iter().find(|e| e.method == method)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
    pub examples: Vec<Example>,
}
